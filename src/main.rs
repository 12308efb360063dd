#[tokio::main]
async fn main() {
    cart_server::start_server().await;
}
