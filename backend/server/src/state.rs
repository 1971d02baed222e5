use std::sync::Arc;

use meilisearch_sdk::client::Client;
use store::{ids, Store};
use tracing::info;

use crate::{chat::ChatRooms, config::Config, search};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub meili: Option<Arc<Client>>,
    pub chat: ChatRooms,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store = store::connect(config.backend, &config.redis_url, &config.sqlite_path)
            .await
            .expect("Store misconfigured!");
        store
            .seed_ranges(&ids::default_ranges())
            .await
            .expect("Seeding number ranges failed!");

        let meili = match &config.meili_url {
            Some(url) => {
                let customers = store
                    .list_customers()
                    .await
                    .expect("Reading customers for the search index failed!");
                Some(search::init_meilisearch(url, config.meili_key.as_deref(), &customers).await)
            }
            None => {
                info!("MEILI_URL not set, customer search disabled");
                None
            }
        };

        Arc::new(Self {
            config,
            store,
            meili,
            chat: ChatRooms::new(),
        })
    }

    /// Assemble a state from pre-built parts; used by tests to run the full
    /// router against an in-memory store.
    pub fn from_parts(
        config: Config,
        store: Arc<dyn Store>,
        meili: Option<Arc<Client>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            meili,
            chat: ChatRooms::new(),
        })
    }
}
