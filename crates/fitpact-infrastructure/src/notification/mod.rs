mod webhook;

pub use webhook::WebhookNotificationSender;
