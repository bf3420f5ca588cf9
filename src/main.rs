use clap::Parser;
use poi_visit_common::offline::{render_sw_js, DirectoryNetwork};
use poi_visit_common::{
    CacheStorage, Grouping, ImportOptions, ImportSession, ServiceWorkerPlan, VisitBundle,
};
use poi_visit_rust::{cli, config, editor, error, export, pack, relay};
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use std::path::{Path, PathBuf};

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn read_bundle(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(error::PoiVisitError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read(path)?)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "visit".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Inspect { bundle, group, mode } => {
            println!("🗺  poi-visit - バンドル取り込み\n");

            let options = ImportOptions {
                grouping: if group { Grouping::SharedLocation } else { config.grouping() },
                media_mode: mode.unwrap_or(config.media_mode),
            };
            let mut session = ImportSession::open(read_bundle(&bundle)?, options)?;

            let visit = session.bundle().visit();
            if let Some(name) = &visit.name {
                println!("訪問: {}", name);
            }
            println!("✔ {}件のPOI / {}件のマーカー\n", visit.len(), session.markers().len());

            for (i, marker) in session.markers().iter().enumerate() {
                let titles: Vec<&str> = marker.popup.entries.iter().map(|e| e.title.as_str()).collect();
                let media_count = marker.popup.media().count();
                println!("[{}] {} - {} (メディア{}件)", i, marker.position, titles.join(" / "), media_count);
            }

            let mut missing_total = 0;
            for poi in session.bundle().pois() {
                for media in session.bundle().missing_media(poi) {
                    if missing_total == 0 {
                        println!("\n⚠ バンドルに無いメディア:");
                    }
                    println!("  - {} ({}: {})", poi.id, media.kind.tag(), media.file_name);
                    missing_total += 1;
                }
            }

            println!(
                "\nメディア展開: {} ({}件のURL)",
                session.media_map().mode(),
                session.media_map().len()
            );
            let revoked = session.close();
            log::debug!("{}件のURLを失効", revoked);
        }

        Commands::Popup { bundle, index, group, mode } => {
            let options = ImportOptions {
                grouping: if group { Grouping::SharedLocation } else { config.grouping() },
                media_mode: mode,
            };
            let mut session = ImportSession::open(read_bundle(&bundle)?, options)?;
            let html = session.open_popup(index)?;
            println!("{}", html);
            session.close();
        }

        Commands::Export { bundle, format, output } => {
            println!("📄 poi-visit - エクスポート\n");

            let visit_bundle = VisitBundle::open(&bundle)?;
            let visit = visit_bundle.visit();
            let title = visit.name.clone().unwrap_or_else(|| file_stem(&bundle));
            let output_dir = output.unwrap_or_else(|| {
                bundle.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
            });
            let output_path = export::output_path_for_format(&output_dir, &title, format);

            println!("- {}を生成中...", format);
            export::export_visit(visit, format, &output_path)?;
            println!("✔ {}件のPOIを出力: {}", visit.len(), output_path.display());

            println!("\n✅ エクスポート完了");
        }

        Commands::Convert { input, output } => {
            println!("🔁 poi-visit - トラック変換\n");
            let track = export::convert_track(&input, &output)?;
            println!(
                "✔ {}点 / {:.0}m を出力: {}",
                track.len(),
                track.length_m(),
                output.display()
            );
        }

        Commands::Pack { folder, output, name } => {
            println!("📦 poi-visit - バンドル作成\n");

            let output = output.unwrap_or_else(|| folder.join("visit.zip"));
            println!("[1/2] 写真をスキャン中...");
            let report = pack::pack_folder(&folder, &output, name)?;
            println!("[2/2] 書き込み完了");
            println!("✔ {}件のPOIを作成: {}", report.packed, report.output.display());

            if !report.skipped.is_empty() {
                println!("\n除外した写真 ({}件):", report.skipped.len());
                for file_name in &report.skipped {
                    println!("  - {}", file_name);
                }
            }

            println!("\n✅ 完了");
        }

        Commands::Edit { bundle, output } => {
            println!("📝 poi-visit - コメント入力\n");
            editor::run_interactive_edit(&bundle, output.as_deref())?;
        }

        Commands::Sw { cache_name, assets, strategy, offline, output, check } => {
            println!("⚙ poi-visit - サービスワーカー生成\n");

            let mut plan = ServiceWorkerPlan::new(
                cache_name.unwrap_or_else(|| config.default_cache_name.clone()),
                assets,
                strategy.unwrap_or(config.default_strategy),
            );
            plan.offline_fallback = offline;

            if let Some(site) = check {
                println!("- インストールを検証中: {}", site.display());
                let network = DirectoryNetwork::new(site);
                let mut storage = CacheStorage::new();
                let count = plan.install(&mut storage, &network)?;
                println!("✔ {}件のアセットを確認", count);
            }

            std::fs::write(&output, render_sw_js(&plan))?;
            println!(
                "✔ {} ({}, {}件) を出力: {}",
                plan.cache_name,
                plan.strategy,
                plan.assets.len(),
                output.display()
            );
        }

        Commands::Relay { bind } => {
            let bind = bind.unwrap_or_else(|| config.relay_bind());
            println!("📡 poi-visit - シグナリング中継 (ws://{}/ws)", bind);
            println!("Ctrl+C で終了\n");
            relay::serve(&bind).await?;
        }

        Commands::Config { set_bind, show } => {
            let mut config = config;

            if let Some(bind) = set_bind {
                config.set_relay_bind(bind)?;
                println!("✔ 待ち受けアドレスを設定しました");
            }

            if show {
                println!("設定:");
                println!("  待ち受けアドレス: {}", config.relay_bind());
                println!("  キャッシュ名: {}", config.default_cache_name);
                println!("  キャッシュ戦略: {}", config.default_strategy);
                println!("  メディア展開: {}", config.media_mode);
                println!("  マーカーをまとめる: {}", if config.group_markers { "はい" } else { "いいえ" });
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}
