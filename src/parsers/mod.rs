//! Normalization layer: one extractor per upstream source, plus the shared
//! validation, metadata, and classification machinery they sit on.

pub mod cfb;
pub mod common;
pub mod metadata;
pub mod nfl_boxscore;
pub mod nfl_game_ids;
pub mod position;
pub mod prizepicks;
pub mod validate;
