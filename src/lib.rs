//! poi-visit: 訪問バンドル・トラック変換・オフラインキャッシュ・シグナリング中継

pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod pack;
pub mod relay;
pub mod scanner;
