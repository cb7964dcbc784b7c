pub mod assertions;
pub mod test_lobby;

pub use test_lobby::TestLobby;
