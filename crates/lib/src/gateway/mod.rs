//! Webhook mode: HTTP endpoint Telegram POSTs updates to.
//!
//! One port serves the webhook route and a health probe on `/`.

mod server;

pub use server::{run_webhook, webhook_router, WebhookState, SECRET_HEADER};
