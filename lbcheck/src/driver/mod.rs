//! DBドライバ境界
//!
//! 接続の確立と、クライアント側で追跡される負荷マップの読み取りを抽象化する。
//!
//! - [`Connector`]: 接続の確立・解放
//! - [`LoadReader`]: ノードごとのクライアント側接続数（読み取り専用 + リセット）
//!
//! 具体実装として素のPostgreSQL接続（[`PgConnector`]）と、
//! 最小負荷ノードを選ぶクライアントサイド負荷分散（[`BalancedPgConnector`]）を持つ。

pub mod balanced;
pub mod load_map;
pub mod pg;
pub mod url;

pub use balanced::{BalancedConnection, BalancedPgConnector};
pub use load_map::ClientLoadMap;
pub use pg::PgConnector;
pub use url::ConnectionUrl;

use async_trait::async_trait;
use lbcheck_common::HarnessResult;

/// 接続の確立と解放
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// 確立された接続
    type Connection: Send + 'static;

    /// 新しい接続を1本確立する
    async fn connect(&self) -> HarnessResult<Self::Connection>;

    /// 接続を解放する
    async fn close(&self, connection: Self::Connection);

    /// コネクタが内部で保持している資源（制御接続など）を解放する
    async fn shutdown(&self) {}
}

/// クライアント側負荷マップの読み取り
pub trait LoadReader: Send + Sync {
    /// 指定ノードに対してクライアントが記録している接続数
    fn load(&self, node: &str) -> usize;

    /// 記録をすべてクリアする
    fn reset(&self);
}
