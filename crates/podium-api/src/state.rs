use std::sync::Arc;

use podium_db::Database;

use crate::content::EventContent;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub content: EventContent,
    pub session_secret: String,
    /// Controls cookie `Secure` flag and error detail exposure.
    pub production: bool,
}
