use crate::test_utils::TestContext;
use crate::{Address, Error, DECIMALS, GENESIS_ALLOCATION};

#[test]
fn test_genesis_distribution() {
    let holder1 = Address::from_bytes([0x01; 20]);
    let holder2 = Address::from_bytes([0x02; 20]);
    let ctx = TestContext::with_holders(&[holder1, holder2]);

    let info = ctx.chain.token_info(ctx.token).unwrap();
    assert_eq!(info.decimals, 6);
    assert_eq!(DECIMALS, 6);
    assert_eq!(GENESIS_ALLOCATION, 1_000_000_000 * 1_000_000);

    assert_eq!(ctx.balance(ctx.owner), GENESIS_ALLOCATION);
    assert_eq!(ctx.balance(holder1), GENESIS_ALLOCATION);
    assert_eq!(ctx.balance(holder2), GENESIS_ALLOCATION);
    assert_eq!(info.total_supply, 3 * GENESIS_ALLOCATION);
    assert_eq!(info.owner, ctx.owner);
    assert_eq!(info.symbol, "MIDR");
}

#[test]
fn test_genesis_rejects_zero_holder() {
    let chain = crate::Chain::default();
    let owner = Address::from_bytes([0x0a; 20]);
    let err = chain
        .deploy_token(owner, "Mock IDR", "MIDR", owner, &[Address::ZERO])
        .unwrap_err();
    assert_eq!(err, Error::InvalidAddress("receiver"));
    assert_eq!(chain.block_number(), 0);
}

#[test]
fn test_mint_then_burn_restores_supply() {
    let ctx = TestContext::new();
    let holder = ctx.generate_address();
    let supply = ctx.chain.total_supply(ctx.token).unwrap();

    ctx.chain.mint(ctx.token, ctx.owner, holder, 500).unwrap();
    assert_eq!(ctx.balance(holder), 500);
    assert_eq!(ctx.chain.total_supply(ctx.token).unwrap(), supply + 500);

    ctx.chain.burn(ctx.token, ctx.owner, holder, 500).unwrap();
    assert_eq!(ctx.balance(holder), 0);
    assert_eq!(ctx.chain.total_supply(ctx.token).unwrap(), supply);
}

#[test]
fn test_only_owner_mints_and_burns() {
    let ctx = TestContext::new();
    let other = ctx.generate_address();

    ctx.chain.mint(ctx.token, ctx.owner, other, 1_000).unwrap();

    let err = ctx.chain.mint(ctx.token, other, other, 1_000).unwrap_err();
    assert_eq!(
        err,
        Error::Unauthorized {
            caller: other,
            required: "owner"
        }
    );

    ctx.chain.burn(ctx.token, ctx.owner, other, 500).unwrap();
    assert_eq!(ctx.balance(other), 500);

    assert!(matches!(
        ctx.chain.burn(ctx.token, other, other, 100),
        Err(Error::Unauthorized { .. })
    ));
    assert_eq!(ctx.balance(other), 500);
}

#[test]
fn test_zero_mint_is_a_noop() {
    let ctx = TestContext::new();
    let holder = ctx.generate_address();
    let supply = ctx.chain.total_supply(ctx.token).unwrap();

    let receipt = ctx.chain.mint(ctx.token, ctx.owner, holder, 0).unwrap();
    assert_eq!(receipt.logs.len(), 1);
    assert_eq!(ctx.balance(holder), 0);
    assert_eq!(ctx.chain.total_supply(ctx.token).unwrap(), supply);
}

#[test]
fn test_mint_overflow_rejected() {
    let ctx = TestContext::new();
    let holder = ctx.generate_address();
    let supply = ctx.chain.total_supply(ctx.token).unwrap();

    let err = ctx
        .chain
        .mint(ctx.token, ctx.owner, holder, u128::MAX)
        .unwrap_err();
    assert_eq!(err, Error::Overflow);
    assert_eq!(ctx.chain.total_supply(ctx.token).unwrap(), supply);
}

#[test]
fn test_burn_more_than_balance_fails() {
    let ctx = TestContext::new();
    let holder = ctx.generate_address();
    ctx.chain.mint(ctx.token, ctx.owner, holder, 10).unwrap();

    let err = ctx.chain.burn(ctx.token, ctx.owner, holder, 11).unwrap_err();
    assert_eq!(
        err,
        Error::InsufficientBalance {
            account: holder,
            balance: 10,
            needed: 11
        }
    );
    assert_eq!(ctx.balance(holder), 10);
}

#[test]
fn test_transfer() {
    let ctx = TestContext::new();
    let alice = ctx.generate_address();
    let bob = ctx.generate_address();
    ctx.chain.mint(ctx.token, ctx.owner, alice, 100).unwrap();

    ctx.chain.transfer(ctx.token, alice, bob, 60).unwrap();
    assert_eq!(ctx.balance(alice), 40);
    assert_eq!(ctx.balance(bob), 60);

    let err = ctx.chain.transfer(ctx.token, alice, bob, 41).unwrap_err();
    assert!(matches!(err, Error::InsufficientBalance { balance: 40, needed: 41, .. }));

    // Sending to yourself changes nothing.
    ctx.chain.transfer(ctx.token, bob, bob, 60).unwrap();
    assert_eq!(ctx.balance(bob), 60);

    assert_eq!(
        ctx.chain
            .transfer(ctx.token, bob, Address::ZERO, 1)
            .unwrap_err(),
        Error::InvalidAddress("receiver")
    );
}

#[test]
fn test_approve_and_transfer_from() {
    let ctx = TestContext::new();
    let holder = ctx.generate_address();
    let spender = ctx.generate_address();
    let target = ctx.generate_address();
    ctx.chain.mint(ctx.token, ctx.owner, holder, 1_000).unwrap();

    let err = ctx
        .chain
        .transfer_from(ctx.token, spender, holder, target, 1)
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientAllowance { allowance: 0, .. }));

    ctx.chain.approve(ctx.token, holder, spender, 300).unwrap();
    assert_eq!(ctx.chain.allowance(ctx.token, holder, spender).unwrap(), 300);

    ctx.chain
        .transfer_from(ctx.token, spender, holder, target, 200)
        .unwrap();
    assert_eq!(ctx.balance(holder), 800);
    assert_eq!(ctx.balance(target), 200);
    assert_eq!(ctx.chain.allowance(ctx.token, holder, spender).unwrap(), 100);

    let err = ctx
        .chain
        .transfer_from(ctx.token, spender, holder, target, 101)
        .unwrap_err();
    assert_eq!(
        err,
        Error::InsufficientAllowance {
            owner: holder,
            spender,
            allowance: 100,
            needed: 101
        }
    );
}

#[test]
fn test_transfer_from_keeps_allowance_when_balance_short() {
    let ctx = TestContext::new();
    let holder = ctx.generate_address();
    let spender = ctx.generate_address();
    ctx.chain.mint(ctx.token, ctx.owner, holder, 10).unwrap();
    ctx.chain.approve(ctx.token, holder, spender, 50).unwrap();

    let err = ctx
        .chain
        .transfer_from(ctx.token, spender, holder, spender, 20)
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientBalance { .. }));
    assert_eq!(ctx.chain.allowance(ctx.token, holder, spender).unwrap(), 50);
}

#[test]
fn test_infinite_allowance_is_not_spent() {
    let ctx = TestContext::new();
    let holder = ctx.generate_address();
    let spender = ctx.generate_address();
    ctx.chain.mint(ctx.token, ctx.owner, holder, 10).unwrap();
    ctx.chain
        .approve(ctx.token, holder, spender, u128::MAX)
        .unwrap();

    ctx.chain
        .transfer_from(ctx.token, spender, holder, spender, 10)
        .unwrap();
    assert_eq!(
        ctx.chain.allowance(ctx.token, holder, spender).unwrap(),
        u128::MAX
    );
}

#[test]
fn test_approve_zero_spender_rejected() {
    let ctx = TestContext::new();
    assert_eq!(
        ctx.chain
            .approve(ctx.token, ctx.owner, Address::ZERO, 1)
            .unwrap_err(),
        Error::InvalidAddress("spender")
    );
}

#[test]
fn test_transfer_token_ownership() {
    let ctx = TestContext::new();
    let new_owner = ctx.generate_address();

    ctx.chain
        .transfer_ownership(ctx.token, ctx.owner, new_owner)
        .unwrap();
    assert_eq!(ctx.chain.owner_of(ctx.token).unwrap(), new_owner);
    assert!(ctx.chain.mint(ctx.token, ctx.owner, new_owner, 1).is_err());
    ctx.chain.mint(ctx.token, new_owner, new_owner, 1).unwrap();
}
