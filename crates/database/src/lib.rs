////////////////////////////////////////////////////////////////////////
//
// 1. 每个Domain(Entity)单独一个文件夹
// 2. 每个Domain由两部分组成:
//    - model: 定义Schema
//    - repository: 实际的数据库底层操作
//
//////////////////////////////////////////////////////////////////////

use mongodb::{
    bson::doc,
    options::IndexOptions,
    Client, Collection, IndexModel,
};
use std::sync::Arc;
use tracing::info;
use utils::{AppConfig, AppResult};
use wallet::repository::{REFERRAL_CODE_INDEX, WALLET_ADDRESS_INDEX};

pub mod wallet;

#[derive(Clone, Debug)]
pub struct Database {
    pub db: mongodb::Database,
    pub wallets: Collection<wallet::model::Wallet>,
}

impl Database {
    pub async fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = Client::with_uri_str(&config.mongo_uri).await?;
        let db: mongodb::Database = client.database(&config.mongo_db);

        let wallets = db.collection("wallets");

        info!("🧱 database({:#}) connected.", &config.mongo_db);

        Ok(Database { db, wallets })
    }

    /// 初始化钱包集合的唯一索引
    ///
    /// 地址与推荐码的唯一性由存储层兜底，先查后插的竞态在插入时会被
    /// 唯一索引拦下并转成Conflict。
    pub async fn init_wallet_indexes(&self) -> AppResult<()> {
        let address_index = IndexModel::builder()
            .keys(doc! { "wallet_address": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(WALLET_ADDRESS_INDEX.to_string())
                    .build(),
            )
            .build();

        let referral_code_index = IndexModel::builder()
            .keys(doc! { "referral_code": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(REFERRAL_CODE_INDEX.to_string())
                    .build(),
            )
            .build();

        self.wallets.create_index(address_index, None).await?;
        self.wallets.create_index(referral_code_index, None).await?;

        info!("✅ 钱包唯一索引初始化完成");
        Ok(())
    }
}
