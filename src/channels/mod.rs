mod formatting;
mod telegram;

pub use telegram::{BotMessenger, TelegramChannel};
