use std::sync::Arc;

use crate::{
    cart::CartService,
    config::Config,
    directory::RedisDirectory,
    store::{RedisCartStore, init_redis},
};

pub struct State {
    pub config: Config,
    pub carts: CartService,
}

impl State {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let redis_connection = init_redis(&config.redis_url).await;

        let directory = Arc::new(RedisDirectory::new(redis_connection.clone()));
        let store = Arc::new(RedisCartStore::new(redis_connection));

        let carts = CartService::new(
            directory.clone(),
            directory.clone(),
            directory,
            store,
        );

        Arc::new(Self { config, carts })
    }
}
