use crate::{wallet::model::Wallet, Database};
use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::{
    bson::{doc, Bson},
    options::FindOptions,
    Cursor,
};
use std::sync::Arc;
use utils::{AppError, AppResult};

/// 唯一索引名，插入冲突时通过错误信息中的索引名区分冲突来源
pub const WALLET_ADDRESS_INDEX: &str = "uniq_wallet_address";
pub const REFERRAL_CODE_INDEX: &str = "uniq_referral_code";

pub type DynWalletRepository = Arc<dyn WalletRepositoryTrait + Send + Sync>;

// 主要用于Service中，表示提供了该Trait功能
#[async_trait]
pub trait WalletRepositoryTrait {
    // 按钱包地址精确查询
    async fn find_by_address(&self, wallet_address: &str) -> AppResult<Option<Wallet>>;

    // 按推荐码精确查询
    async fn find_by_referral_code(&self, referral_code: &str) -> AppResult<Option<Wallet>>;

    // 插入新注册记录并返回文档ID(撞唯一索引时返回Conflict，错误信息携带索引名)
    async fn insert_wallet(&self, wallet: Wallet) -> AppResult<Bson>;

    // 推荐人计数+1(依赖存储层的原子$inc)，返回实际更新的文档数
    async fn increment_referral_count(&self, referral_code: &str) -> AppResult<u64>;

    // 注册总数
    async fn count_wallets(&self) -> AppResult<u64>;

    // 某时间戳之后的注册数
    async fn count_registered_since(&self, since: u64) -> AppResult<u64>;

    // 填写了推荐码的注册数
    async fn count_referred(&self) -> AppResult<u64>;

    // 按推荐人数降序的前N名
    async fn top_referrers(&self, limit: i64) -> AppResult<Vec<Wallet>>;

    // 某推荐码名下的注册记录，最新在前
    async fn find_referred_by(&self, referral_code: &str, limit: i64) -> AppResult<Vec<Wallet>>;

    // 数据库连通性检查
    async fn ping(&self) -> AppResult<()>;
}

#[async_trait]
impl WalletRepositoryTrait for Database {
    async fn find_by_address(&self, wallet_address: &str) -> AppResult<Option<Wallet>> {
        let filter = doc! { "wallet_address": wallet_address };
        let wallet = self.wallets.find_one(filter, None).await?;

        Ok(wallet)
    }

    async fn find_by_referral_code(&self, referral_code: &str) -> AppResult<Option<Wallet>> {
        let filter = doc! { "referral_code": referral_code };
        let wallet = self.wallets.find_one(filter, None).await?;

        Ok(wallet)
    }

    async fn insert_wallet(&self, wallet: Wallet) -> AppResult<Bson> {
        match self.wallets.insert_one(wallet, None).await {
            Ok(result) => Ok(result.inserted_id),
            Err(err) => match duplicate_key_message(&err) {
                Some(message) => Err(AppError::Conflict(message)),
                None => Err(err.into()),
            },
        }
    }

    async fn increment_referral_count(&self, referral_code: &str) -> AppResult<u64> {
        let result = self
            .wallets
            .update_one(
                doc! { "referral_code": referral_code },
                doc! { "$inc": { "referral_count": 1_i64 } },
                None,
            )
            .await?;

        Ok(result.modified_count)
    }

    async fn count_wallets(&self) -> AppResult<u64> {
        let count = self.wallets.count_documents(doc! {}, None).await?;

        Ok(count)
    }

    async fn count_registered_since(&self, since: u64) -> AppResult<u64> {
        let count = self
            .wallets
            .count_documents(doc! { "created_at": { "$gte": since as f64 } }, None)
            .await?;

        Ok(count)
    }

    async fn count_referred(&self) -> AppResult<u64> {
        let count = self
            .wallets
            .count_documents(doc! { "referred_by": { "$ne": null } }, None)
            .await?;

        Ok(count)
    }

    async fn top_referrers(&self, limit: i64) -> AppResult<Vec<Wallet>> {
        let options = FindOptions::builder()
            .sort(doc! { "referral_count": -1 })
            .limit(limit)
            .build();

        let cursor: Cursor<Wallet> = self
            .wallets
            .find(doc! { "referral_count": { "$gt": 0 } }, options)
            .await?;

        Ok(drain_cursor(cursor).await)
    }

    async fn find_referred_by(&self, referral_code: &str, limit: i64) -> AppResult<Vec<Wallet>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .build();

        let cursor: Cursor<Wallet> = self
            .wallets
            .find(doc! { "referred_by": referral_code }, options)
            .await?;

        Ok(drain_cursor(cursor).await)
    }

    async fn ping(&self) -> AppResult<()> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;

        Ok(())
    }
}

/// 提取E11000重复键错误的信息，非重复键错误返回None
fn duplicate_key_message(err: &mongodb::error::Error) -> Option<String> {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(write_error)) = &*err.kind {
        if write_error.code == 11000 {
            return Some(write_error.message.clone());
        }
    }

    None
}

async fn drain_cursor(mut cursor: Cursor<Wallet>) -> Vec<Wallet> {
    let mut wallets = Vec::new();

    while let Some(doc) = cursor.next().await {
        match doc {
            Ok(wallet) => wallets.push(wallet),
            Err(_) => continue, // Ignore error and continue with next document
        }
    }

    wallets
}
