/// Lenient payload shapes for the game, rosters and questions.
pub mod game;
/// User input checks run before a command is built.
pub mod validation;
/// Wire envelope, inbound messages and outbound commands.
pub mod ws;
