//! 短码分配
//!
//! 自定义别名：校验格式后检查唯一性；否则从全局序列取值做 base62 编码。
//! 检查与写入之间不是原子的，最终由存储层唯一约束裁决。

use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, ShortenerError};
use crate::storage::{LinkStore, SequenceSource};
use crate::utils::base62;
use crate::utils::url_validator::validate_custom_alias;

/// 分配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedCode {
    pub code: String,
    pub is_custom_alias: bool,
}

pub struct Allocator {
    sequence: Arc<dyn SequenceSource>,
    store: Arc<dyn LinkStore>,
}

impl Allocator {
    pub fn new(sequence: Arc<dyn SequenceSource>, store: Arc<dyn LinkStore>) -> Self {
        Self { sequence, store }
    }

    pub async fn allocate(&self, custom_alias: Option<&str>) -> Result<AllocatedCode> {
        match custom_alias {
            Some(alias) => {
                validate_custom_alias(alias)
                    .map_err(|e| ShortenerError::invalid_alias(e.to_string()))?;

                if self.store.exists(alias).await? {
                    return Err(ShortenerError::alias_conflict(format!(
                        "Alias '{}' is already taken",
                        alias
                    )));
                }

                Ok(AllocatedCode {
                    code: alias.to_string(),
                    is_custom_alias: true,
                })
            }
            None => {
                // 序列值一经取出即消耗，即使后续写入失败也不回收
                let value = self.sequence.next_value().await?;
                let code = base62::encode(value);
                debug!("Allocated sequence value {} as '{}'", value, code);

                Ok(AllocatedCode {
                    code,
                    is_custom_alias: false,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{UrlMapping, UrlStats};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct Counter(AtomicU64);

    #[async_trait]
    impl SequenceSource for Counter {
        async fn next_value(&self) -> Result<u64> {
            Ok(self.0.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    #[derive(Default)]
    struct Codes(Mutex<HashSet<String>>);

    #[async_trait]
    impl LinkStore for Codes {
        async fn insert(&self, mapping: &UrlMapping) -> Result<()> {
            self.0.lock().unwrap().insert(mapping.code.clone());
            Ok(())
        }

        async fn get(&self, _code: &str) -> Result<Option<UrlMapping>> {
            Ok(None)
        }

        async fn exists(&self, code: &str) -> Result<bool> {
            Ok(self.0.lock().unwrap().contains(code))
        }

        async fn stats(&self, _code: &str) -> Result<Option<UrlStats>> {
            Ok(None)
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn allocator_with(codes: &[&str]) -> (Allocator, Arc<Counter>) {
        let seq = Arc::new(Counter::default());
        let store = Codes::default();
        for c in codes {
            store.0.lock().unwrap().insert(c.to_string());
        }
        (Allocator::new(seq.clone(), Arc::new(store)), seq)
    }

    #[tokio::test]
    async fn test_generated_codes_follow_sequence() {
        let (allocator, _) = allocator_with(&[]);
        let first = allocator.allocate(None).await.unwrap();
        let second = allocator.allocate(None).await.unwrap();

        assert_eq!(first.code, "1");
        assert_eq!(second.code, "2");
        assert!(!first.is_custom_alias);
    }

    #[tokio::test]
    async fn test_custom_alias_accepted() {
        let (allocator, seq) = allocator_with(&[]);
        let got = allocator.allocate(Some("promo-2024")).await.unwrap();
        assert_eq!(got.code, "promo-2024");
        assert!(got.is_custom_alias);
        // 自定义别名不消耗序列
        assert_eq!(seq.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reserved_alias_rejected() {
        let (allocator, _) = allocator_with(&[]);
        for alias in ["api", "Health", "ADMIN", "shorten"] {
            let err = allocator.allocate(Some(alias)).await.unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidAlias(_)), "{}", alias);
        }
    }

    #[tokio::test]
    async fn test_malformed_alias_rejected() {
        let (allocator, _) = allocator_with(&[]);
        for alias in ["ab", "has space", "way-too-long-alias-for-this", "emoji🙂"] {
            let err = allocator.allocate(Some(alias)).await.unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidAlias(_)), "{}", alias);
        }
    }

    #[tokio::test]
    async fn test_taken_alias_conflicts() {
        let (allocator, _) = allocator_with(&["promo"]);
        let err = allocator.allocate(Some("promo")).await.unwrap_err();
        assert!(matches!(err, ShortenerError::AliasConflict(_)));
    }
}
