pub mod groups;
pub mod mailer;
pub mod repositories;
