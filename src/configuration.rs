use crate::{error::ConfigurationError, slot_grid::SlotGrid};

pub trait Configuration: Clone + Send + Sync + 'static {
    fn website_title(&self) -> String;
    fn admin_emails(&self) -> Vec<String>;
    fn database_url(&self) -> Option<String>;
    fn port(&self) -> String;
    fn slot_grid(&self) -> Result<SlotGrid, ConfigurationError>;
}
