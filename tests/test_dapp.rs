#[cfg(feature = "http")]
#[cfg(test)]
mod test_dapp {
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tezos_devkit::dapp::*;
    use tezos_devkit::network::{AResult, TezosNode};
    use tezos_devkit::wallet::{OperationReceipt, OriginateParams, TransferParams, Wallet};
    use tezos_devkit::{Address, Micheline, Schema, Tez};

    const CONTRACT: &str = "KT1VR4Rc3ovru3ogpaRu9qtubNLiHQUq54c6";
    const OP_HASH: &str = "ooG169iWhv7vQccPGcB2EWeAjpWpxHAsBHGqtYWUvNpLaFjLhv5";

    /// Records what it was asked to send and confirms everything.
    #[derive(Default)]
    struct FakeWallet {
        transfers: Mutex<Vec<Vec<TransferParams>>>,
        originations: Mutex<Vec<OriginateParams>>,
        originated: Vec<Address>,
    }

    impl FakeWallet {
        fn receipt(&self) -> OperationReceipt {
            OperationReceipt {
                hash: OP_HASH.to_string(),
                originated_contracts: self.originated.clone(),
            }
        }
    }

    #[async_trait]
    impl Wallet for FakeWallet {
        async fn transfer(&self, params: TransferParams) -> AResult<OperationReceipt> {
            self.transfers.lock().unwrap().push(vec![params]);
            Ok(self.receipt())
        }

        async fn batch(&self, params: Vec<TransferParams>) -> AResult<OperationReceipt> {
            self.transfers.lock().unwrap().push(params);
            Ok(self.receipt())
        }

        async fn originate(&self, params: OriginateParams) -> AResult<OperationReceipt> {
            self.originations.lock().unwrap().push(params);
            Ok(self.receipt())
        }
    }

    fn contract() -> Address {
        CONTRACT.parse().unwrap()
    }

    fn dapp_with(wallet: &Arc<FakeWallet>) -> Dapp {
        Dapp::new(TezosNode::ghostnet()).with_wallet(wallet.clone())
    }

    fn code() -> Micheline {
        serde_json::from_str(
            r#"[{"prim":"parameter","args":[{"prim":"nat"}]},
                {"prim":"storage","args":[{"prim":"nat"}]},
                {"prim":"code","args":[[{"prim":"CAR"},{"prim":"NIL","args":[{"prim":"operation"}]},{"prim":"PAIR"}]]}]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_call_param() {
        let params = Parameters {
            amount: Some(Tez::from_mutez(10)),
            ..Parameters::default()
        };
        let call = get_call_param(&contract(), "set_n", Micheline::int(1), &params);
        assert_eq!(
            call,
            CallParameter {
                destination: contract(),
                amount: Tez::from_mutez(10),
                fee: None,
                entrypoint: "set_n".to_string(),
                arg: Micheline::int(1),
            }
        );

        let defaults = get_call_param(&contract(), "default", Micheline::unit(), &Parameters::default());
        assert_eq!(defaults.amount, Tez::ZERO);
    }

    #[tokio::test]
    async fn test_call() {
        let wallet = Arc::new(FakeWallet::default());
        let params = Parameters {
            amount: Some(Tez::from_mutez(5)),
            fee: Some(Tez::from_mutez(2000)),
            sender: None,
        };
        let result = dapp_with(&wallet)
            .call(&contract(), "set_n", Micheline::int(7), &params)
            .await
            .unwrap();
        assert_eq!(result.operation_hash, OP_HASH);
        assert_eq!(result.storage_size, 0);
        assert!(result.events.is_empty());

        let sent = wallet.transfers.lock().unwrap();
        assert_eq!(
            sent.as_slice(),
            [vec![TransferParams {
                to: contract(),
                amount: Tez::from_mutez(5),
                fee: Some(Tez::from_mutez(2000)),
                entrypoint: "set_n".to_string(),
                value: Micheline::int(7),
            }]]
        );
    }

    #[tokio::test]
    async fn test_zero_fee_is_estimated() {
        let wallet = Arc::new(FakeWallet::default());
        let params = Parameters {
            fee: Some(Tez::ZERO),
            ..Parameters::default()
        };
        dapp_with(&wallet)
            .call(&contract(), "set_n", Micheline::int(7), &params)
            .await
            .unwrap();
        assert_eq!(wallet.transfers.lock().unwrap()[0][0].fee, None);
    }

    #[tokio::test]
    async fn test_batch() {
        let wallet = Arc::new(FakeWallet::default());
        let dapp = dapp_with(&wallet);
        let calls = [
            get_call_param(&contract(), "set_n", Micheline::int(1), &Parameters::default()),
            get_call_param(&contract(), "set_n", Micheline::int(2), &Parameters::default()),
        ];
        let result = dapp.exec_batch(&calls).await.unwrap();
        assert_eq!(result.operation_hash, OP_HASH);
        {
            let sent = wallet.transfers.lock().unwrap();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].len(), 2);
            assert_eq!(sent[0][1].value, Micheline::int(2));
        }

        let error = dapp.exec_batch(&[]).await.unwrap_err();
        assert_eq!(
            error.downcast_ref::<DappError>(),
            Some(&DappError::EmptyBatch)
        );
        assert_eq!(wallet.transfers.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_originate() {
        let wallet = Arc::new(FakeWallet {
            originated: vec![contract()],
            ..FakeWallet::default()
        });
        let params = Parameters {
            amount: Some(Tez::from_mutez(100)),
            ..Parameters::default()
        };
        let result = dapp_with(&wallet)
            .originate(code(), Micheline::int(0), &params)
            .await
            .unwrap();
        assert_eq!(result.address, contract());
        assert_eq!(result.operation_hash, OP_HASH);

        let sent = wallet.originations.lock().unwrap();
        assert_eq!(sent[0].balance, Tez::from_mutez(100));
        assert_eq!(sent[0].storage, Micheline::int(0));
        assert_eq!(sent[0].fee, None);
    }

    #[tokio::test]
    async fn test_originate_errors() {
        // Wallet that reports no originated contract.
        let wallet = Arc::new(FakeWallet::default());
        let dapp = dapp_with(&wallet);
        let error = dapp
            .originate(code(), Micheline::int(0), &Parameters::default())
            .await
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<DappError>(),
            Some(&DappError::AddressNotFound)
        );

        let error = dapp
            .originate(Micheline::prim("CAR"), Micheline::int(0), &Parameters::default())
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<DappError>(),
            Some(DappError::InvalidCode(_))
        ));
        // Invalid code is rejected before reaching the wallet.
        assert_eq!(wallet.originations.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_wallet() {
        let dapp = Dapp::new(TezosNode::ghostnet());
        assert!(dapp.supports(Capability::Read));
        assert!(!dapp.supports(Capability::Call));
        assert!(!dapp.supports(Capability::Originate));

        let error = dapp
            .call(&contract(), "set_n", Micheline::int(1), &Parameters::default())
            .await
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<DappError>(),
            Some(&DappError::MissingWallet)
        );
        let error = dapp.exec_batch(&[]).await.unwrap_err();
        assert_eq!(
            error.downcast_ref::<DappError>(),
            Some(&DappError::MissingWallet)
        );
    }

    #[tokio::test]
    async fn test_not_implemented() {
        let wallet = Arc::new(FakeWallet::default());
        let dapp = dapp_with(&wallet);
        assert!(dapp.supports(Capability::Batch));
        for capability in [
            Capability::Deploy,
            Capability::DeployFromJson,
            Capability::DeployCallback,
            Capability::CallbackValue,
        ] {
            assert!(!dapp.supports(capability));
        }

        let params = Parameters::default();
        let error = dapp
            .deploy("contract.tz", &serde_json::json!({}), &params)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "'deploy' not implemented.");
        let error = dapp
            .deploy_from_json("counter", &serde_json::json!([]), Micheline::int(0), &params)
            .await
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<DappError>(),
            Some(&DappError::NotImplemented("deploy_from_json"))
        );
        assert!(dapp
            .deploy_callback("cb", &Micheline::prim("nat"), &params)
            .await
            .is_err());
        assert!(dapp
            .get_callback_value(&contract(), &Schema::new(Micheline::prim("nat")))
            .await
            .is_err());
        assert!(wallet.transfers.lock().unwrap().is_empty());
    }
}
