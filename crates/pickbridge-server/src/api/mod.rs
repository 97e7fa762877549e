pub mod players;
pub mod plugin;
pub mod selections;
pub mod settings;
pub mod tags;
pub mod users;
