mod discord;
mod dto;

pub use discord::DiscordDirectory;
