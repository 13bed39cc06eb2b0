//! Built-in checkers. Each is registered by `CheckerRegistry::standard`.

mod blacklist;
mod keyword;
mod level_wall;

pub use blacklist::BlacklistLoopChecker;
pub use keyword::KeywordChecker;
pub use level_wall::LevelWallChecker;
