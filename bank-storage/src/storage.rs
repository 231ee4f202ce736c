//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `accounts` - Account records (key: account_id)
//! - `iban_index` - IBAN to account id (key: iban bytes)
//! - `owner_index` - Accounts per owner (key: owner_id || account_id)
//! - `transactions` - Append-only ledger entries (key: entry id, UUIDv7)
//! - `debit_index` - Debits per owner in time order
//!   (key: owner_id || timestamp || entry id, value: amount)

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use account_core::{
    Account, AccountId, AccountRepository, Error as AccountError, Iban, UserId,
};
use bank_ledger::repository::sort_newest_first;
use bank_ledger::{
    Error as LedgerError, Page, Transaction, TransactionFilter, TransactionRepository,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction, IteratorMode,
    Options, WriteBatch, DB,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";
const CF_IBAN_INDEX: &str = "iban_index";
const CF_OWNER_INDEX: &str = "owner_index";
const CF_TRANSACTIONS: &str = "transactions";
const CF_DEBIT_INDEX: &str = "debit_index";

/// Storage wrapper for RocksDB.
///
/// Implements both persistence ports over one database so an engine
/// deployment has a single on-disk home. Account writes go through an
/// internal mutex; each port call is atomic on its own even when the
/// caller holds no higher-level locks.
pub struct Storage {
    db: Arc<DB>,
    // Serializes account read-modify-write cycles
    write_lock: Mutex<()>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        db_opts.set_level_zero_file_num_compaction_trigger(
            config.rocksdb.level0_file_num_compaction_trigger,
        );

        // Universal compaction for the append-heavy transaction log
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Self::cf_options_accounts()),
            ColumnFamilyDescriptor::new(CF_IBAN_INDEX, Self::cf_options_indices()),
            ColumnFamilyDescriptor::new(CF_OWNER_INDEX, Self::cf_options_indices()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_transactions()),
            ColumnFamilyDescriptor::new(CF_DEBIT_INDEX, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?} with 5 column families", path);

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    // Column family options

    fn cf_options_accounts() -> Options {
        let mut opts = Options::default();
        // Account records are read on every operation, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Indices benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_options_transactions() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Account record helpers

    fn load_account(&self, id: AccountId) -> Result<Option<Account>> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        match self.db.get_cf(&cf, id.as_uuid().as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    fn put_account_record(&self, account: &Account) -> Result<()> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = bincode::serialize(account)?;
        self.db.put_cf(&cf, account.id.as_uuid().as_bytes(), &value)?;
        Ok(())
    }

    fn iban_lookup(&self, iban: &Iban) -> Result<Option<AccountId>> {
        let cf = self.cf_handle(CF_IBAN_INDEX)?;
        match self.db.get_cf(&cf, iban.as_str().as_bytes())? {
            Some(value) if value.len() == 16 => {
                let bytes: [u8; 16] = value[..16].try_into().unwrap();
                Ok(Some(AccountId::from_uuid(Uuid::from_bytes(bytes))))
            }
            Some(_) => Err(Error::Storage("Corrupt iban_index entry".to_string())),
            None => Ok(None),
        }
    }

    /// Insert account and both index entries atomically. The caller
    /// has already checked IBAN uniqueness under `write_lock`.
    fn insert_unchecked(&self, account: &Account) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        let value = bincode::serialize(account)?;
        batch.put_cf(&cf_accounts, account.id.as_uuid().as_bytes(), &value);

        let cf_iban = self.cf_handle(CF_IBAN_INDEX)?;
        batch.put_cf(
            &cf_iban,
            account.iban.as_str().as_bytes(),
            account.id.as_uuid().as_bytes(),
        );

        let cf_owner = self.cf_handle(CF_OWNER_INDEX)?;
        let idx_owner = owner_index_key(account.owner, account.id);
        batch.put_cf(&cf_owner, idx_owner, b"");

        self.db.write(batch)?;
        Ok(())
    }

    fn owned_ids(&self, owner: UserId) -> Result<Vec<AccountId>> {
        let cf = self.cf_handle(CF_OWNER_INDEX)?;
        let prefix = owner.as_uuid().into_bytes();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix[..], Direction::Forward));

        let mut ids = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            if key.len() >= 32 {
                let id_bytes: [u8; 16] = key[16..32].try_into().unwrap();
                ids.push(AccountId::from_uuid(Uuid::from_bytes(id_bytes)));
            }
        }
        Ok(ids)
    }

    // Ledger entry helpers

    fn append_entry(&self, tx: &Transaction) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_tx = self.cf_handle(CF_TRANSACTIONS)?;
        let value = bincode::serialize(tx)?;
        batch.put_cf(&cf_tx, tx.id.as_bytes(), &value);

        // Debit index feeds the daily-limit sum: one entry per debit,
        // keyed so a single forward scan covers [since, now].
        if let Some(sender) = &tx.sender {
            let cf_debits = self.cf_handle(CF_DEBIT_INDEX)?;
            let key = debit_key(sender.owner, &tx.timestamp, tx.id);
            batch.put_cf(&cf_debits, key, bincode::serialize(&tx.amount)?);
        }

        self.db.write(batch)?;

        tracing::debug!(entry = %tx.id, kind = %tx.kind, "Ledger entry persisted");
        Ok(())
    }

    fn load_entry(&self, id: Uuid) -> Result<Option<Transaction>> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        match self.db.get_cf(&cf, id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    fn search_entries(&self, filter: &TransactionFilter, page: Page) -> Result<Vec<Transaction>> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let iter = self.db.iterator_cf(&cf, IteratorMode::End);

        let mut matches = Vec::new();
        for item in iter {
            let (_, value) = item?;
            let tx: Transaction = bincode::deserialize(&value)?;
            if filter.matches(&tx) {
                matches.push(tx);
            }
        }
        // Key order is creation order (UUIDv7); settle sub-millisecond
        // ties on the entry timestamp before paginating.
        sort_newest_first(&mut matches);
        Ok(matches
            .into_iter()
            .skip(page.offset())
            .take(page.size)
            .collect())
    }

    fn sum_debits(&self, user: UserId, since: DateTime<Utc>) -> Result<Decimal> {
        let cf = self.cf_handle(CF_DEBIT_INDEX)?;
        let prefix = user.as_uuid().into_bytes();
        let mut start = [0u8; 24];
        start[..16].copy_from_slice(&prefix);
        start[16..24].copy_from_slice(&ts_order_bytes(&since));

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&start[..], Direction::Forward));

        let mut total = Decimal::ZERO;
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let amount: Decimal = bincode::deserialize(&value)?;
            total += amount;
        }
        Ok(total)
    }

    // Statistics

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            total_accounts: self.approximate_count(CF_ACCOUNTS)?,
            total_transactions: self.approximate_count(CF_TRANSACTIONS)?,
        })
    }

    fn approximate_count(&self, name: &str) -> Result<u64> {
        let cf = self.cf_handle(name)?;
        // RocksDB property for approximate count
        let prop = self
            .db
            .property_int_value_cf(&cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);
        Ok(prop)
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

fn owner_index_key(owner: UserId, id: AccountId) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(owner.as_uuid().as_bytes());
    key[16..32].copy_from_slice(id.as_uuid().as_bytes());
    key
}

fn debit_key(owner: UserId, timestamp: &DateTime<Utc>, id: Uuid) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..16].copy_from_slice(owner.as_uuid().as_bytes());
    key[16..24].copy_from_slice(&ts_order_bytes(timestamp));
    key[24..40].copy_from_slice(id.as_bytes());
    key
}

/// Sign-flipped big-endian nanoseconds: byte order matches
/// chronological order even for pre-epoch timestamps.
fn ts_order_bytes(ts: &DateTime<Utc>) -> [u8; 8] {
    let nanos = ts.timestamp_nanos_opt().unwrap_or(i64::MAX);
    ((nanos as u64) ^ (1 << 63)).to_be_bytes()
}

fn to_account_err(e: Error) -> AccountError {
    AccountError::Storage(e.to_string())
}

fn to_ledger_err(e: Error) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

impl AccountRepository for Storage {
    fn get(&self, id: AccountId) -> account_core::Result<Option<Account>> {
        self.load_account(id).map_err(to_account_err)
    }

    fn get_by_iban(&self, iban: &Iban) -> account_core::Result<Option<Account>> {
        match self.iban_lookup(iban).map_err(to_account_err)? {
            Some(id) => self.load_account(id).map_err(to_account_err),
            None => Ok(None),
        }
    }

    fn list_by_owner(&self, owner: UserId) -> account_core::Result<Vec<Account>> {
        let ids = self.owned_ids(owner).map_err(to_account_err)?;
        let mut accounts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(account) = self.load_account(id).map_err(to_account_err)? {
                accounts.push(account);
            }
        }
        Ok(accounts)
    }

    fn insert(&self, account: &Account) -> account_core::Result<()> {
        let _guard = self.write_lock.lock();
        if self
            .iban_lookup(&account.iban)
            .map_err(to_account_err)?
            .is_some()
        {
            return Err(AccountError::DuplicateIban(account.iban.to_string()));
        }
        self.insert_unchecked(account).map_err(to_account_err)
    }

    fn set_active(&self, id: AccountId, active: bool) -> account_core::Result<Account> {
        let _guard = self.write_lock.lock();
        let mut account = self
            .load_account(id)
            .map_err(to_account_err)?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        account.active = active;
        self.put_account_record(&account).map_err(to_account_err)?;
        Ok(account)
    }

    fn apply_delta(&self, id: AccountId, delta: Decimal) -> account_core::Result<Account> {
        let _guard = self.write_lock.lock();
        let mut account = self
            .load_account(id)
            .map_err(to_account_err)?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        if !account.active {
            return Err(AccountError::Inactive(account.iban.to_string()));
        }
        let new_balance = account.balance + delta;
        if new_balance < account.absolute_limit {
            return Err(AccountError::InvariantViolation(format!(
                "balance {} would sink below floor {} on account {}",
                new_balance, account.absolute_limit, account.iban
            )));
        }
        account.balance = new_balance;
        self.put_account_record(&account).map_err(to_account_err)?;
        Ok(account)
    }
}

impl TransactionRepository for Storage {
    fn append(&self, tx: &Transaction) -> bank_ledger::Result<()> {
        self.append_entry(tx).map_err(to_ledger_err)
    }

    fn get(&self, id: Uuid) -> bank_ledger::Result<Option<Transaction>> {
        self.load_entry(id).map_err(to_ledger_err)
    }

    fn search(&self, filter: &TransactionFilter, page: Page) -> bank_ledger::Result<Vec<Transaction>> {
        self.search_entries(filter, page).map_err(to_ledger_err)
    }

    fn sum_debits_since(&self, user: UserId, since: DateTime<Utc>) -> bank_ledger::Result<Decimal> {
        self.sum_debits(user, since).map_err(to_ledger_err)
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Approximate number of account records.
    pub total_accounts: u64,

    /// Approximate number of ledger entries.
    pub total_transactions: u64,
}
