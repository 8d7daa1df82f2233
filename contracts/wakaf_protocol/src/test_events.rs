use crate::test_utils::TestContext;
use crate::{Address, EventEnvelope, WakafEvent, GENESIS_ALLOCATION};

#[test]
fn test_genesis_events() {
    let ctx = TestContext::new();
    let events: Vec<EventEnvelope> = ctx.sink.events();

    // Token: ownership + one genesis mint. Wakaf: ownership + initial nazir.
    assert_eq!(events.len(), 4);
    assert_eq!(
        events[0].event,
        WakafEvent::OwnershipTransferred {
            previous_owner: Address::ZERO,
            new_owner: ctx.owner,
        }
    );
    assert_eq!(events[0].contract, ctx.token);
    assert_eq!(
        events[1].event,
        WakafEvent::Transfer {
            from: Address::ZERO,
            to: ctx.owner,
            value: GENESIS_ALLOCATION,
        }
    );
    assert_eq!(events[2].contract, ctx.wakaf);
    assert_eq!(events[3].event, WakafEvent::NazirAdded { nazir: ctx.nazir });
    assert_eq!(events[3].id(), "2-1");
}

#[test]
fn test_nazir_management_events() {
    let ctx = TestContext::new();
    let nazir = ctx.generate_address();

    ctx.chain.add_nazir(ctx.wakaf, ctx.owner, nazir).unwrap();
    let added = ctx.sink.last().expect("No events found");
    assert_eq!(added.contract, ctx.wakaf);
    assert_eq!(added.event, WakafEvent::NazirAdded { nazir });
    assert_eq!(added.event.name(), "NazirAdded");

    ctx.chain.remove_nazir(ctx.wakaf, ctx.owner, nazir).unwrap();
    let removed = ctx.sink.last().expect("No events found");
    assert_eq!(removed.event, WakafEvent::NazirRemoved { nazir });
    assert_eq!(removed.block_number, added.block_number + 1);
}

#[test]
fn test_money_out_event() {
    let ctx = TestContext::new();
    let recipient = ctx.generate_address();
    ctx.fund_escrow(5_000);

    let (_, receipt) = ctx
        .chain
        .money_out(ctx.wakaf, ctx.nazir, ctx.token, 5_000, recipient, "Event test")
        .unwrap();

    // Token transfer first, then the escrow's record event, same block.
    assert_eq!(receipt.logs.len(), 2);
    assert_eq!(receipt.logs[0].contract, ctx.token);
    assert_eq!(
        receipt.logs[0].event,
        WakafEvent::Transfer {
            from: ctx.wakaf,
            to: recipient,
            value: 5_000,
        }
    );
    assert_eq!(receipt.logs[1].contract, ctx.wakaf);
    assert_eq!(
        receipt.logs[1].event,
        WakafEvent::MoneyOut {
            nazir: ctx.nazir,
            send_to: recipient,
            amount: 5_000,
            token_address: ctx.token,
            reason: "Event test".to_string(),
        }
    );
    assert_eq!(receipt.logs[1].event.name(), "MoneyOutEvent");
    assert_eq!(receipt.logs[1].log_index, 1);
    assert_eq!(ctx.sink.last().unwrap(), receipt.logs[1]);
}

#[test]
fn test_rejected_calls_emit_nothing() {
    let ctx = TestContext::new();
    let stranger = ctx.generate_address();
    let before = ctx.sink.len();

    assert!(ctx.chain.mint(ctx.token, stranger, stranger, 1).is_err());
    assert!(ctx.chain.add_nazir(ctx.wakaf, stranger, stranger).is_err());
    assert!(ctx
        .chain
        .money_out(ctx.wakaf, ctx.nazir, ctx.token, 1, stranger, "x")
        .is_err());

    assert_eq!(ctx.sink.len(), before);
}

#[test]
fn test_event_positions_strictly_increase() {
    let ctx = TestContext::new();
    let donor = ctx.generate_address();
    ctx.donate(donor, 100);
    ctx.chain
        .money_out(ctx.wakaf, ctx.nazir, ctx.token, 40, donor, "refund")
        .unwrap();

    let positions: Vec<(u64, u32)> = ctx
        .sink
        .events()
        .iter()
        .map(|e| (e.block_number, e.log_index))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_event_json_shape() {
    let ctx = TestContext::new();
    let recipient = ctx.generate_address();
    ctx.fund_escrow(10);
    let (_, receipt) = ctx
        .chain
        .money_out(ctx.wakaf, ctx.nazir, ctx.token, 10, recipient, "json")
        .unwrap();

    let json = serde_json::to_value(&receipt.logs[1]).unwrap();
    assert_eq!(json["event"]["kind"], "money_out");
    assert_eq!(json["event"]["amount"], "10");
    assert_eq!(json["event"]["send_to"], recipient.to_string());
}

#[test]
fn test_channel_sink_delivers_in_order() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let chain = crate::Chain::new(crate::ChannelSink::new(tx));
    let operator = Address::from_bytes([0x42; 20]);
    crate::genesis::deploy(&chain, &crate::GenesisConfig::single_operator(operator)).unwrap();

    let mut ids = Vec::new();
    while let Ok(event) = rx.try_recv() {
        ids.push(event.id());
    }
    assert_eq!(ids, vec!["1-0", "1-1", "2-0", "2-1"]);
}

#[test]
fn test_closure_sink() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let chain = crate::Chain::new(move |_: &EventEnvelope| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let operator = Address::from_bytes([0x42; 20]);
    crate::genesis::deploy(&chain, &crate::GenesisConfig::single_operator(operator)).unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 4);
}
