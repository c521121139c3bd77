////////////////////////////////////////////////////////////////////////
//
// 1. 每个Domain(Entity)单独一个文件夹
// 2. Service封装业务规则，底层操作全部走repository trait
//
//////////////////////////////////////////////////////////////////////

pub mod wallet;

use database::Database;
use std::sync::Arc;
use tracing::info;
use wallet::wallet_service::{DynWalletService, WalletService};

#[derive(Clone)]
pub struct Services {
    pub wallet: DynWalletService,
}

impl Services {
    pub fn new(db: Database) -> Self {
        let database = Arc::new(db);
        let wallet = Arc::new(WalletService::new(database.clone())) as DynWalletService;

        info!("🧠 Services initialized");

        Self { wallet }
    }
}
