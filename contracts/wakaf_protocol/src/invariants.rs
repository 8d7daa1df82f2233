//! Property tests over random operation sequences.

use proptest::prelude::*;

use crate::events::EventLog;
use crate::test_utils::TestContext;
use crate::{Address, Amount, TokenLedger};

#[derive(Clone, Debug)]
enum Op {
    Mint { to: usize, amount: Amount },
    Burn { from: usize, amount: Amount },
    Transfer { from: usize, to: usize, amount: Amount },
}

const ACCOUNTS: usize = 5;

fn account(i: usize) -> Address {
    Address::from_bytes([i as u8 + 1; 20])
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let amount = 0u128..10_000u128;
    prop_oneof![
        (0..ACCOUNTS, amount.clone()).prop_map(|(to, amount)| Op::Mint { to, amount }),
        (0..ACCOUNTS, amount.clone()).prop_map(|(from, amount)| Op::Burn { from, amount }),
        (0..ACCOUNTS, 0..ACCOUNTS, amount)
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
    ]
}

proptest! {
    #[test]
    fn supply_equals_sum_of_balances(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let owner = account(0);
        let mut logs = EventLog::default();
        let mut token = TokenLedger::new(
            Address::from_bytes([0xee; 20]),
            "Mock IDR",
            "MIDR",
            owner,
            &[account(1)],
            &mut logs,
        )
        .unwrap();

        for op in ops {
            let before: Vec<Amount> = (0..ACCOUNTS).map(|i| token.balance_of(&account(i))).collect();
            let supply_before = token.total_supply();

            let result = match op {
                Op::Mint { to, amount } => token.mint(owner, account(to), amount, &mut logs),
                Op::Burn { from, amount } => token.burn(owner, account(from), amount, &mut logs),
                Op::Transfer { from, to, amount } => {
                    token.transfer(account(from), account(to), amount, &mut logs)
                }
            };

            prop_assert_eq!(token.total_supply(), token.sum_of_balances());
            if result.is_err() {
                let after: Vec<Amount> = (0..ACCOUNTS).map(|i| token.balance_of(&account(i))).collect();
                prop_assert_eq!(before, after);
                prop_assert_eq!(supply_before, token.total_supply());
            }
        }
    }

    #[test]
    fn money_out_never_overdraws(amounts in prop::collection::vec(1u128..500u128, 1..32)) {
        let ctx = TestContext::new();
        let recipient = ctx.generate_address();
        ctx.fund_escrow(2_000);

        let mut expected_records = 0u64;
        for amount in amounts {
            let escrow_before = ctx.escrow_balance();
            match ctx.chain.money_out(ctx.wakaf, ctx.nazir, ctx.token, amount, recipient, "p") {
                Ok((record, _)) => {
                    prop_assert!(amount <= escrow_before);
                    prop_assert_eq!(record.index, expected_records);
                    expected_records += 1;
                    prop_assert_eq!(ctx.escrow_balance(), escrow_before - amount);
                }
                Err(_) => {
                    prop_assert!(amount > escrow_before);
                    prop_assert_eq!(ctx.escrow_balance(), escrow_before);
                }
            }
            prop_assert_eq!(
                ctx.chain.money_out_count(ctx.wakaf, ctx.nazir).unwrap(),
                expected_records
            );
        }
        prop_assert_eq!(ctx.escrow_balance() + ctx.balance(recipient), 2_000);
    }
}
