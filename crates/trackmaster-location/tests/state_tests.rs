use proptest::prelude::*;
use trackmaster_location::{BackendKind, TrackingError};
use trackmaster_test_utils::{valid_reading, SessionFixture};

#[derive(Debug, Clone, Copy)]
enum Op {
    Begin,
    End,
    Deliver,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Begin), Just(Op::End), Just(Op::Deliver)]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_at_most_one_live_handle_and_all_released(
        native in any::<bool>(),
        ops in proptest::collection::vec(op(), 0..40),
    ) {
        runtime().block_on(async {
            let mut fx = if native { SessionFixture::native() } else { SessionFixture::browser() };
            let mut started = 0usize;

            for op in ops {
                let was_tracking = fx.session.is_tracking();
                match op {
                    Op::Begin => match fx.session.begin().await {
                        Ok(kind) => {
                            assert!(!was_tracking);
                            assert_eq!(kind == BackendKind::Background, native);
                            started += 1;
                        }
                        Err(e) => {
                            assert!(was_tracking);
                            assert!(matches!(e, TrackingError::AlreadyTracking(_)));
                        }
                    },
                    Op::End => {
                        fx.session.end().unwrap();
                        assert!(!fx.session.is_tracking());
                    }
                    Op::Deliver => {
                        let res = fx.session.handle_reading(valid_reading()).await;
                        assert_eq!(res.is_ok(), was_tracking);
                        assert_eq!(fx.session.is_tracking(), was_tracking);
                    }
                }

                let released = if native {
                    fx.background.removed().len()
                } else {
                    fx.foreground.cleared().len()
                };
                let live = started - released;
                assert!(live <= 1);
                assert_eq!(live == 1, fx.session.is_tracking());
            }

            fx.session.end().unwrap();
            let released = fx.background.removed().len() + fx.foreground.cleared().len();
            assert_eq!(released, started);
        });
    }
}
