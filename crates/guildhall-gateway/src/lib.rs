pub mod auth;
pub mod context;
pub mod error;
pub mod installation;
pub mod registration;
pub mod router;
pub mod server;
pub mod state;

pub use context::ModuleContext;
pub use registration::{RegistrationView, render_registration_cards};
pub use server::GatewayServer;
pub use state::{AppState, SharedState};
