//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约冒烟测试
//! - Source → Fork → SequentialMerge 数据流
//! - 由 blueprint 驱动的 fork

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, FlowError, ForkConfig};

    #[test]
    fn test_contracts_compile() {
        let _ = ConfigVersion::V1;
        assert!(ForkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_flow_error_is_cloneable() {
        let err = FlowError::participant("upper", "boom");
        assert_eq!(err.clone(), err);
        assert!(err.to_string().contains("upper"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{channel, BranchOp, ForkConfig, Readable};
    use flow::{Source, Stage, TransformStage};
    use fork::{Fork, Participant};

    async fn collect<T: Send + 'static>(rx: Readable<T>) -> Vec<T> {
        tokio::time::timeout(Duration::from_secs(5), rx.collect())
            .await
            .expect("merged output did not end")
            .expect("unexpected in-band error")
    }

    fn upper() -> Participant<String, String> {
        Participant::stage(TransformStage::map("upper", |s: String| s.to_uppercase()))
    }

    fn length_callback() -> Participant<String, String> {
        Participant::callback(|source: &Source<String>| {
            let stage = TransformStage::map("length", |s: String| s.len().to_string());
            Box::new(stage).connect(source.tap())
        })
    }

    fn identity() -> Participant<String, String> {
        Participant::stage(TransformStage::map("identity", |s: String| s))
    }

    fn words() -> Vec<String> {
        ["a", "bb", "ccc"].iter().map(|s| s.to_string()).collect()
    }

    /// End-to-end test: Source -> Fork (stage + callback | join | stage) -> SequentialMerge
    ///
    /// 验证 join 之后的 batch 输出排在之前所有 batch 之后
    #[tokio::test]
    async fn test_e2e_join_orders_batches() {
        let source = Source::from_iter("words", words());
        let mut fork: Fork<String, String> = Fork::new();

        fork.add(upper()).add(length_callback()).join().add(identity());
        source.pipe(&mut fork);
        let merged = fork.finish();

        let out = collect(merged).await;
        assert_eq!(out.len(), 9);

        let mut first: Vec<_> = out[..6].to_vec();
        first.sort();
        assert_eq!(first, vec!["1", "2", "3", "A", "BB", "CCC"]);
        assert_eq!(&out[6..], &["a", "bb", "ccc"]);
    }

    #[tokio::test]
    async fn test_e2e_pipe_before_attach() {
        let mut fork: Fork<String, String> = Fork::new();
        fork.add(upper());
        let merged = fork.output();
        assert!(fork.has_merge());
        assert_eq!(fork.stats().participants_started, 0);

        let source = Source::from_iter("late", words());
        source.pipe(&mut fork);
        assert_eq!(fork.close().participants_started, 1);

        assert_eq!(collect(merged).await, vec!["A", "BB", "CCC"]);
    }

    #[tokio::test]
    async fn test_e2e_pipe_twice_feeds_both() {
        let source = Source::from_iter("twice", words());
        let mut fork: Fork<String, String> = Fork::new();
        fork.add(identity());
        source.pipe(&mut fork);

        let (tx_a, rx_a) = channel(8);
        let (tx_b, rx_b) = channel(8);
        fork.pipe(tx_a).pipe(tx_b);
        assert_eq!(fork.close().participants_started, 1);

        assert_eq!(collect(rx_a).await, words());
        assert_eq!(collect(rx_b).await, words());
    }

    #[tokio::test]
    async fn test_e2e_reattach_after_detach() {
        let mut fork: Fork<String, String> = Fork::new();
        fork.add(upper());

        let first = Source::from_iter("first", vec!["x".to_string()]);
        first.pipe(&mut fork);
        first.unpipe(&mut fork);
        assert_eq!(fork.source_id(), None);

        let second = Source::from_iter("second", vec!["y".to_string()]);
        second.pipe(&mut fork);
        assert_eq!(fork.source_id(), Some(second.id()));

        let merged = fork.finish();
        assert_eq!(collect(merged).await, vec!["Y"]);
    }

    #[tokio::test]
    async fn test_e2e_small_capacity_does_not_stall() {
        let lines: Vec<String> = (0..200).map(|i| i.to_string()).collect();
        let source = Source::with_tap_capacity(
            "bulk",
            {
                let (tx, rx) = channel(1);
                let lines = lines.clone();
                tokio::spawn(async move {
                    for line in lines {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                });
                rx
            },
            1,
        );

        let config = ForkConfig {
            channel_capacity: 1,
            merge_capacity: 1,
            ..ForkConfig::named("bulk")
        };
        let mut fork: Fork<String, String> = Fork::with_config(config);
        fork.add(identity()).join().add(identity()).join().add(identity());
        source.pipe(&mut fork);
        let merged = fork.finish();

        let out = collect(merged).await;
        assert_eq!(out.len(), 600);
        assert_eq!(&out[..200], lines.as_slice());
        assert_eq!(&out[400..], lines.as_slice());
    }

    /// Blueprint -> participants -> Fork
    #[tokio::test]
    async fn test_e2e_blueprint_driven_fork() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[fork]
name = "blueprint"

[[batches]]
[[batches.branches]]
name = "shout"
op = "upper"

[[batches]]
[[batches.branches]]
name = "tag"
op = "prefix"
arg = "> "
mode = "callback"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let mut fork: Fork<String, String> = Fork::with_config(blueprint.fork.clone());
        for (index, batch) in blueprint.batches.iter().enumerate() {
            if index > 0 {
                fork.join();
            }
            for branch in &batch.branches {
                let arg = branch.arg.clone().unwrap_or_default();
                let op = branch.op;
                fork.add(Participant::stage(TransformStage::map(
                    branch.name.clone(),
                    move |s: String| match op {
                        BranchOp::Upper => s.to_uppercase(),
                        BranchOp::Prefix => format!("{arg}{s}"),
                        _ => s,
                    },
                )));
            }
        }
        assert_eq!(fork.name(), "blueprint");
        assert_eq!(fork.pending_batches(), 2);

        let source = Source::from_iter("lines", vec!["hi".to_string()]);
        source.pipe(&mut fork);
        let merged = fork.finish();

        assert_eq!(collect(merged).await, vec!["HI", "> hi"]);
    }
}
