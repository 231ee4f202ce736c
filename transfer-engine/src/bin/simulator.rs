//! Bank simulator binary
//!
//! Drives the transfer engine with concurrent random traffic against
//! in-memory stores, then reconciles balances against the ledger.
//!
//! Knobs via environment: `SIM_CUSTOMERS`, `SIM_WORKERS`, `SIM_OPS`.

use std::sync::Arc;
use std::thread;

use account_core::{
    AccountStore, Currency, Iban, MemoryAccounts, MemoryUserDirectory, NewAccount,
    StructuralIbanValidator, UserId,
};
use anyhow::Context;
use bank_ledger::{Ledger, MemoryTransactions, TransactionFilter};
use limits_engine::{LimitsStore, UserLimits};
use rand::prelude::*;
use rust_decimal::Decimal;
use transfer_engine::{
    DepositRequest, EngineConfig, Role, RoleGuard, TransferEngine, TransferRequest,
    WithdrawRequest,
};

struct Customer {
    user: UserId,
    current_iban: String,
    saving_iban: Option<String>,
}

fn env_or(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn iban_for(index: usize, suffix: char) -> String {
    format!("NL91MERI{:08}{}", index, suffix)
}

fn onboard(
    engine: &TransferEngine,
    accounts: &AccountStore,
    limits: &LimitsStore,
    directory: &MemoryUserDirectory,
    guard: &RoleGuard,
    index: usize,
    teller: UserId,
) -> anyhow::Result<Customer> {
    let user = UserId::new();
    directory.register(user, format!("customer{:03}", index));
    guard.assign(user, Role::Customer);
    limits
        .provision(
            user,
            UserLimits {
                transaction_limit: Decimal::from(500),
                daily_transaction_limit: Decimal::from(2_000),
                ..UserLimits::default()
            },
        )
        .context("provisioning limits")?;

    let current_iban = iban_for(index, 'C');
    accounts
        .open_account(NewAccount {
            absolute_limit: Decimal::from(-200),
            ..NewAccount::current(user, Iban::new(&current_iban), Currency::EUR)
        })
        .context("opening current account")?;

    let saving_iban = if index % 2 == 0 {
        let iban = iban_for(index, 'S');
        accounts
            .open_account(NewAccount::saving(user, Iban::new(&iban), Currency::EUR))
            .context("opening saving account")?;
        Some(iban)
    } else {
        None
    };

    engine
        .deposit(
            &DepositRequest {
                iban: current_iban.clone(),
                amount: Decimal::from(1_000),
                currency_type: Currency::EUR,
            },
            teller,
        )
        .context("seeding opening balance")?;

    Ok(Customer {
        user,
        current_iban,
        saving_iban,
    })
}

fn random_op(engine: &TransferEngine, customers: &[Customer], rng: &mut ThreadRng) -> bool {
    let actor = customers.choose(rng).expect("at least one customer");
    let amount = Decimal::from(rng.gen_range(1..=150));

    let result = match rng.gen_range(0..4) {
        0 => engine.deposit(
            &DepositRequest {
                iban: actor.current_iban.clone(),
                amount,
                currency_type: Currency::EUR,
            },
            actor.user,
        ),
        1 => engine.withdraw(
            &WithdrawRequest {
                iban: actor.current_iban.clone(),
                amount,
                currency_type: Currency::EUR,
            },
            actor.user,
        ),
        2 if actor.saving_iban.is_some() => engine.transfer(
            &TransferRequest {
                sender_iban: actor.current_iban.clone(),
                receiver_iban: actor.saving_iban.clone().expect("checked above"),
                amount,
                description: "Sweep to savings".to_owned(),
            },
            actor.user,
        ),
        _ => {
            let peer = customers.choose(rng).expect("at least one customer");
            engine.transfer(
                &TransferRequest {
                    sender_iban: actor.current_iban.clone(),
                    receiver_iban: peer.current_iban.clone(),
                    amount,
                    description: "Peer payment".to_owned(),
                },
                actor.user,
            )
        }
    };

    match result {
        Ok(_) => true,
        Err(err) if err.is_rejection() => false,
        Err(err) => panic!("engine fault during simulation: {}", err),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let customer_count = env_or("SIM_CUSTOMERS", 8);
    let workers = env_or("SIM_WORKERS", 4);
    let ops_per_worker = env_or("SIM_OPS", 250);

    tracing::info!(customer_count, workers, ops_per_worker, "Starting bank simulator");

    let accounts = Arc::new(AccountStore::new(
        Arc::new(MemoryAccounts::new()),
        Arc::new(StructuralIbanValidator),
    ));
    let ledger = Arc::new(Ledger::new(Arc::new(MemoryTransactions::new())));
    let limits = Arc::new(LimitsStore::new());
    let guard = Arc::new(RoleGuard::new());
    let directory = Arc::new(MemoryUserDirectory::new());

    let teller = UserId::new();
    directory.register(teller, "teller");
    guard.assign(teller, Role::Employee);

    let engine = Arc::new(TransferEngine::new(
        Arc::clone(&accounts),
        Arc::clone(&ledger),
        Arc::clone(&limits),
        guard.clone() as Arc<dyn transfer_engine::AuthorizationGuard>,
        directory.clone() as Arc<dyn account_core::UserDirectory>,
        EngineConfig::default(),
    )?);

    let customers: Arc<Vec<Customer>> = Arc::new(
        (0..customer_count)
            .map(|index| onboard(&engine, &accounts, &limits, &directory, &guard, index, teller))
            .collect::<anyhow::Result<_>>()?,
    );

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            let customers = Arc::clone(&customers);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                let mut committed = 0usize;
                let mut rejected = 0usize;
                for _ in 0..ops_per_worker {
                    if random_op(&engine, &customers, &mut rng) {
                        committed += 1;
                    } else {
                        rejected += 1;
                    }
                }
                tracing::info!(worker, committed, rejected, "Worker finished");
                (committed, rejected)
            })
        })
        .collect();

    let mut committed = 0usize;
    let mut rejected = 0usize;
    for handle in handles {
        let (c, r) = handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker panicked"))?;
        committed += c;
        rejected += r;
    }

    // Reconciliation: money on account must equal cash in minus cash
    // out, and no balance may sit below its floor.
    let mut total_balance = Decimal::ZERO;
    let mut floor_breaches = 0usize;
    for customer in customers.iter() {
        for account in accounts.list_by_owner(customer.user)? {
            total_balance += account.balance;
            if account.balance < account.absolute_limit {
                floor_breaches += 1;
            }
        }
    }

    let mut cash_in = Decimal::ZERO;
    let mut cash_out = Decimal::ZERO;
    let mut page = bank_ledger::Page::new(0, 500);
    loop {
        let entries = ledger.search(&TransactionFilter::default(), page)?;
        if entries.is_empty() {
            break;
        }
        for entry in &entries {
            match entry.kind {
                bank_ledger::TransactionKind::Deposit => cash_in += entry.amount,
                bank_ledger::TransactionKind::Withdrawal => cash_out += entry.amount,
                bank_ledger::TransactionKind::Transfer => {}
            }
        }
        page = bank_ledger::Page::new(page.number + 1, page.size);
    }

    let metrics = engine.metrics();
    println!("=== bank simulator summary ===");
    println!("operations committed : {}", committed);
    println!("operations rejected  : {}", rejected);
    println!("metrics committed    : {}", metrics.committed_total());
    println!("metrics rejections   : {}", metrics.rejections_total.get());
    println!("cash in              : {}", cash_in);
    println!("cash out             : {}", cash_out);
    println!("sum of balances      : {}", total_balance);
    println!("floor breaches       : {}", floor_breaches);

    if total_balance != cash_in - cash_out {
        anyhow::bail!(
            "reconciliation failed: balances {} != cash flow {}",
            total_balance,
            cash_in - cash_out
        );
    }
    if floor_breaches > 0 {
        anyhow::bail!("{} accounts sit below their floor", floor_breaches);
    }
    tracing::info!("Reconciliation clean");
    Ok(())
}
