use crate::{
    configuration::Configuration,
    error::ConfigurationError,
    slot_grid::{parse_slot_time, SlotGrid},
};
use chrono::NaiveTime;
use clap::Parser;

/// Command line arguments, falling back to environment variables and `.env`.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Booking of shared rooms in half-hour slots")]
pub struct ConfigurationHandler {
    #[arg(long, env = "WEBSITE_TITLE", default_value = "Room Booking")]
    website_title: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    port: String,

    /// Keeps bookings in memory when not set
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Comma separated emails allowed to remove bookings
    #[arg(long, env = "ADMIN_EMAILS", value_delimiter = ',')]
    admin_emails: Vec<String>,

    #[arg(long, env = "OPENING_TIME", default_value = "9:00", value_parser = parse_slot_time)]
    opening_time: NaiveTime,

    #[arg(long, env = "CLOSING_TIME", default_value = "19:00", value_parser = parse_slot_time)]
    closing_time: NaiveTime,

    #[arg(long, env = "SLOT_MINUTES", default_value_t = 30)]
    slot_minutes: u32,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn website_title(&self) -> String {
        self.website_title.clone()
    }

    fn admin_emails(&self) -> Vec<String> {
        self.admin_emails.clone()
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }

    fn port(&self) -> String {
        self.port.clone()
    }

    fn slot_grid(&self) -> Result<SlotGrid, ConfigurationError> {
        SlotGrid::new(self.opening_time, self.closing_time, self.slot_minutes)
    }
}
