use crate::export::ExportFormat;
use clap::{Parser, Subcommand};
use poi_visit_common::{MediaMode, Strategy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "poi-visit")]
#[command(about = "POI訪問バンドル・GPX/KML・オフラインキャッシュ・シグナリング中継ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// バンドルを取り込んでPOI・マーカーを表示
    Inspect {
        /// 訪問バンドル（ZIP）
        #[arg(required = true)]
        bundle: PathBuf,

        /// 同じ座標のPOIを1つのマーカーにまとめる
        #[arg(short, long)]
        group: bool,

        /// メディアの読み込み方 (lazy/eager/inline)
        #[arg(short, long)]
        mode: Option<MediaMode>,
    },

    /// マーカー1件のポップアップHTMLを出力
    Popup {
        /// 訪問バンドル（ZIP）
        #[arg(required = true)]
        bundle: PathBuf,

        /// マーカー番号（0始まり）
        #[arg(required = true)]
        index: usize,

        /// 同じ座標のPOIを1つのマーカーにまとめる
        #[arg(short, long)]
        group: bool,

        /// メディアの読み込み方 (lazy/eager/inline)
        #[arg(short, long, default_value = "inline")]
        mode: MediaMode,
    },

    /// POIをGPX/KML/GeoJSONで書き出す
    Export {
        /// 訪問バンドル（ZIP）
        #[arg(required = true)]
        bundle: PathBuf,

        /// 出力形式 (gpx/kml/geojson)
        #[arg(short, long, default_value = "gpx")]
        format: ExportFormat,

        /// 出力ファイル/ディレクトリ（デフォルト: バンドルと同じ場所）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// トラックを変換（GPX ⇔ KML、拡張子で判定）
    Convert {
        /// 入力ファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ファイル
        #[arg(required = true)]
        output: PathBuf,
    },

    /// 位置情報付きの写真フォルダからバンドルを作成
    Pack {
        /// 写真フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 出力ZIP（デフォルト: 入力フォルダ/visit.zip）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 訪問の名前
        #[arg(short, long)]
        name: Option<String>,
    },

    /// 対話的にPOIのコメントを入力
    Edit {
        /// 訪問バンドル（ZIP）
        #[arg(required = true)]
        bundle: PathBuf,

        /// 出力先（省略時は上書き）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// サービスワーカー（sw.js）を生成
    Sw {
        /// キャッシュ名（デフォルト: 設定値）
        #[arg(long)]
        cache_name: Option<String>,

        /// 事前キャッシュするURL
        #[arg(long, num_args = 1.., required = true)]
        assets: Vec<String>,

        /// キャッシュ戦略 (cache-first/network-first/stale-while-revalidate)
        #[arg(long)]
        strategy: Option<Strategy>,

        /// オフライン時の代替ページ
        #[arg(long)]
        offline: Option<String>,

        /// 出力ファイル
        #[arg(short, long, default_value = "sw.js")]
        output: PathBuf,

        /// サイトのディレクトリでインストールを検証
        #[arg(long)]
        check: Option<PathBuf>,
    },

    /// シグナリング中継サーバーを起動
    Relay {
        /// 待ち受けアドレス（デフォルト: 設定値）
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// 中継サーバーの待ち受けアドレスを設定
        #[arg(long)]
        set_bind: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
