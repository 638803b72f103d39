use std::sync::Arc;

use gateway::{Gateway, Session};

use super::{config::Config, upload::UploadRegistry};

pub struct AppState<G> {
    pub config: Config,
    pub gateway: G,
    pub uploads: UploadRegistry,
}

impl<G: Gateway> AppState<G> {
    pub fn new(config: Config, gateway: G) -> Arc<Self> {
        let uploads = UploadRegistry::new(config.orphan_policy, config.max_upload_bytes);

        Arc::new(Self {
            config,
            gateway,
            uploads,
        })
    }

    /// Gateway handle acting as the signed-in staff member, so row-level
    /// policies apply to every table and storage call.
    pub fn scoped(&self, session: &Session) -> G {
        self.gateway.authorized(&session.access_token)
    }
}
