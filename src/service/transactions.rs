//! 交易列表展示：合并二级账户的转账与充值，按时间倒序分页
//!
//! 纯展示逻辑，不引入新的数据模型；分页在服务端完成但语义与
//! 客户端固定页大小分页一致

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::response::pagination::{PaginatedResponse, PaginationParams},
    service::intmax::{GatewayError, SecondaryAccountGateway},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TransactionStatus {
    Completed,
    Processing,
    Rejected,
    ReadyToClaim,
    NeedToClaim,
}

/// 二级账户SDK返回的单条交易（转账或充值，未打标）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub digest: String,
    /// Unix毫秒时间戳
    pub timestamp: i64,
    pub amount: String,
    pub token_address: String,
    pub token_index: u32,
    pub status: TransactionStatus,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionOrigin {
    Transfer,
    Deposit,
}

/// 打上来源标记后的交易条目
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaggedTransaction {
    pub origin: TransactionOrigin,
    pub digest: String,
    pub timestamp: i64,
    pub amount: String,
    pub token_address: String,
    pub token_index: u32,
    pub status: TransactionStatus,
    pub from: String,
    pub to: String,
}

impl TaggedTransaction {
    fn from_raw(raw: RawTransaction, origin: TransactionOrigin) -> Self {
        Self {
            origin,
            digest: raw.digest,
            timestamp: raw.timestamp,
            amount: raw.amount,
            token_address: raw.token_address,
            token_index: raw.token_index,
            status: raw.status,
            from: raw.from,
            to: raw.to,
        }
    }
}

/// 合并转账与充值并按时间戳倒序排列
pub fn merge_and_sort(
    transfers: Vec<RawTransaction>,
    deposits: Vec<RawTransaction>,
) -> Vec<TaggedTransaction> {
    let mut combined: Vec<TaggedTransaction> = transfers
        .into_iter()
        .map(|t| TaggedTransaction::from_raw(t, TransactionOrigin::Transfer))
        .chain(
            deposits
                .into_iter()
                .map(|d| TaggedTransaction::from_raw(d, TransactionOrigin::Deposit)),
        )
        .collect();
    combined.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    combined
}

/// 并发拉取两个集合后合并
pub async fn load_transactions(
    gateway: &dyn SecondaryAccountGateway,
    address: &str,
) -> Result<Vec<TaggedTransaction>, GatewayError> {
    let (transfers, deposits) = futures::future::try_join(
        gateway.fetch_transfers(address),
        gateway.fetch_deposits(address),
    )
    .await?;
    Ok(merge_and_sort(transfers, deposits))
}

/// 固定页大小切片
pub fn paginate(
    items: Vec<TaggedTransaction>,
    params: PaginationParams,
) -> PaginatedResponse<TaggedTransaction> {
    let total = items.len() as u64;
    let start = params.offset() as usize;
    let page: Vec<TaggedTransaction> = items
        .into_iter()
        .skip(start)
        .take(params.limit() as usize)
        .collect();
    PaginatedResponse::new(page, params.page, params.page_size, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(digest: &str, ts: i64) -> RawTransaction {
        RawTransaction {
            digest: digest.into(),
            timestamp: ts,
            amount: "0.001".into(),
            token_address: "ETH".into(),
            token_index: 0,
            status: TransactionStatus::Completed,
            from: "0xfrom".into(),
            to: "0xto".into(),
        }
    }

    #[test]
    fn merge_tags_origin_and_sorts_descending() {
        let transfers = vec![tx("t1", 100), tx("t2", 300)];
        let deposits = vec![tx("d1", 200)];

        let merged = merge_and_sort(transfers, deposits);
        let digests: Vec<&str> = merged.iter().map(|t| t.digest.as_str()).collect();
        assert_eq!(digests, vec!["t2", "d1", "t1"]);
        assert_eq!(merged[0].origin, TransactionOrigin::Transfer);
        assert_eq!(merged[1].origin, TransactionOrigin::Deposit);
    }

    #[test]
    fn seven_items_page_size_five_yields_two_pages() {
        let items = merge_and_sort((0..7).map(|i| tx(&format!("t{i}"), i)).collect(), vec![]);

        let page1 = paginate(items.clone(), PaginationParams::new(Some(1), Some(5)));
        assert_eq!(page1.data.len(), 5);
        assert_eq!(page1.total, 7);
        assert_eq!(page1.total_pages, 2);

        let page2 = paginate(items, PaginationParams::new(Some(2), Some(5)));
        assert_eq!(page2.data.len(), 2);
        assert_eq!(page2.total_pages, 2);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let items = merge_and_sort(vec![tx("t1", 1)], vec![]);
        let page = paginate(items, PaginationParams::new(Some(3), Some(5)));
        assert!(page.data.is_empty());
        assert_eq!(page.total, 1);
    }

    #[test]
    fn raw_transaction_uses_camel_case_wire_names() {
        let parsed: RawTransaction = serde_json::from_value(serde_json::json!({
            "digest": "0xabc",
            "timestamp": 1700000000000i64,
            "amount": "0.005",
            "tokenAddress": "USDC",
            "tokenIndex": 0,
            "status": "NeedToClaim",
            "from": "0x1",
            "to": "0x2"
        }))
        .unwrap();
        assert_eq!(parsed.token_address, "USDC");
        assert_eq!(parsed.status, TransactionStatus::NeedToClaim);
    }
}
