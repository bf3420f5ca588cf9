//! 対話式コメント編集モジュール
//!
//! コメントが空のPOIを順に表示し、入力したコメントで visit.json を書き換える。
//! メディアなど他のエントリはそのまま残す。

use crate::error::{PoiVisitError, Result};
use dialoguer::Input;
use poi_visit_common::{rewrite_manifest, Visit, VisitBundle};
use std::path::Path;

/// コメントが空のPOIを抽出
pub fn extract_uncommented(visit: &Visit) -> Vec<usize> {
    visit
        .pois
        .iter()
        .enumerate()
        .filter(|(_, p)| p.comment.trim().is_empty())
        .map(|(i, _)| i)
        .collect()
}

/// コメントを設定（範囲外なら false）
pub fn apply_comment(visit: &mut Visit, index: usize, comment: &str) -> bool {
    match visit.pois.get_mut(index) {
        Some(poi) => {
            poi.comment = comment.trim().to_string();
            true
        }
        None => false,
    }
}

/// 対話アクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    /// コメントを入力
    Input(String),
    /// このPOIをスキップ
    Skip,
    /// 残り全部スキップ
    SkipAll,
    /// 前と同じコメントを適用
    Repeat,
    /// 保存して終了
    Quit,
}

/// 入力文字列をアクションに変換
pub fn parse_action(input: &str, has_prev: bool) -> EditAction {
    let trimmed = input.trim();
    match trimmed {
        "" | "s" => EditAction::Skip,
        "S" => EditAction::SkipAll,
        "r" if has_prev => EditAction::Repeat,
        "q" | "Q" => EditAction::Quit,
        _ => EditAction::Input(trimmed.to_string()),
    }
}

/// 対話式でコメントを入力してバンドルを保存
pub fn run_interactive_edit(input_path: &Path, output_path: Option<&Path>) -> Result<()> {
    let bytes = std::fs::read(input_path)?;
    let mut visit = VisitBundle::from_bytes(bytes.clone())?.visit().clone();

    let indices = extract_uncommented(&visit);
    if indices.is_empty() {
        println!("✓ すべてのPOIにコメントが設定されています");
        return Ok(());
    }

    println!("📝 コメントが未設定のPOI: {}件", indices.len());
    println!("---");
    println!("操作: [Enter/s]スキップ [S]残り全スキップ [r]前と同じ [q]終了");
    println!("---\n");

    let mut prev: Option<String> = None;
    let mut changed = 0usize;

    for (count, &idx) in indices.iter().enumerate() {
        let poi = &visit.pois[idx];
        println!(
            "[{}/{}] {} ({})",
            count + 1,
            indices.len(),
            poi.title,
            poi.location
        );

        let input: String = Input::new()
            .with_prompt("コメント")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| PoiVisitError::Prompt(e.to_string()))?;

        match parse_action(&input, prev.is_some()) {
            EditAction::Input(comment) => {
                apply_comment(&mut visit, idx, &comment);
                println!("  → {}\n", comment);
                prev = Some(comment);
                changed += 1;
            }
            EditAction::Repeat => {
                if let Some(ref comment) = prev {
                    apply_comment(&mut visit, idx, comment);
                    println!("  → {} (前と同じ)\n", comment);
                    changed += 1;
                }
            }
            EditAction::Skip => println!("  → スキップ\n"),
            EditAction::SkipAll => {
                println!("  → 残り全部スキップ\n");
                break;
            }
            EditAction::Quit => {
                println!("保存して終了します...");
                break;
            }
        }
    }

    if changed == 0 {
        println!("変更はありません");
        return Ok(());
    }

    let output = output_path.unwrap_or(input_path);
    let rewritten = rewrite_manifest(&bytes, &visit)?;
    std::fs::write(output, rewritten)?;
    println!("✔ {}件のコメントを保存: {}", changed, output.display());

    Ok(())
}
