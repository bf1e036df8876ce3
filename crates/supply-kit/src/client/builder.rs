//! Transaction builder for single contract invocations.
//!
//! Every request the tracker makes is one `InvokeHostFunction` operation
//! calling one contract function. The builder produces the unsigned,
//! unprepared envelope; simulation and assembly happen later.
//!
//! # Example
//!
//! ```rust
//! use supply_kit::{AccountKey, CallClass, ContractAddress, SourceAccount, TransactionBuilder};
//!
//! # fn example() -> Result<(), supply_kit::Error> {
//! let account = SourceAccount::new(AccountKey::from_bytes([1; 32]), 41);
//! let contract = ContractAddress::from_bytes([2; 32]);
//!
//! let envelope = TransactionBuilder::new(&account, &contract, "get_product")
//!     .u64_arg(7)
//!     .call_class(CallClass::ReadOnly)
//!     .build()?;
//! # let _ = envelope;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use stellar_xdr::curr::{
    HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Memo, Operation, OperationBody,
    Preconditions, ScString, ScSymbol, ScVal, SequenceNumber, StringM, TimeBounds, TimePoint,
    Transaction, TransactionEnvelope, TransactionExt, TransactionV1Envelope, VecM,
};

use crate::error::{Error, ParseProductIdError};
use crate::types::{ContractAddress, SourceAccount};

/// Default validity window of a built transaction.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How a call affects the ledger. Decides the base fee bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CallClass {
    /// Only simulated, never submitted.
    #[default]
    ReadOnly,
    /// Signed and submitted.
    StateChanging,
}

impl CallClass {
    /// Base fee in stroops.
    pub fn base_fee(&self) -> u32 {
        match self {
            CallClass::ReadOnly => 100,
            CallClass::StateChanging => 100_000,
        }
    }
}

/// Builder for a transaction invoking one contract function.
#[derive(Debug)]
pub struct TransactionBuilder {
    account: SourceAccount,
    contract: ContractAddress,
    function: String,
    args: Vec<ScVal>,
    fee: Option<u32>,
    call_class: CallClass,
    timeout: Duration,
    valid_until: Option<u64>,
    error: Option<Error>,
}

impl TransactionBuilder {
    /// Start a call of `function` on `contract`, sourced from `account`.
    pub fn new(account: &SourceAccount, contract: &ContractAddress, function: &str) -> Self {
        Self {
            account: account.clone(),
            contract: *contract,
            function: function.to_string(),
            args: Vec::new(),
            fee: None,
            call_class: CallClass::default(),
            timeout: DEFAULT_TIMEOUT,
            valid_until: None,
            error: None,
        }
    }

    /// Append an argument.
    pub fn arg(mut self, value: ScVal) -> Self {
        self.args.push(value);
        self
    }

    /// Append a string argument.
    pub fn string_arg(mut self, value: &str) -> Self {
        match StringM::try_from(value) {
            Ok(s) => self.args.push(ScVal::String(ScString(s))),
            Err(e) => {
                self.error.get_or_insert(Error::Xdr(e));
            }
        }
        self
    }

    /// Append an unsigned 64-bit argument.
    pub fn u64_arg(self, value: u64) -> Self {
        self.arg(ScVal::U64(value))
    }

    /// Override the fee bid. Takes precedence over the call class.
    pub fn fee(mut self, stroops: u32) -> Self {
        self.fee = Some(stroops);
        self
    }

    pub fn call_class(mut self, class: CallClass) -> Self {
        self.call_class = class;
        self
    }

    /// Validity window counted from `build()`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute expiry as Unix seconds. Overrides the timeout.
    pub fn valid_until(mut self, unix_secs: u64) -> Self {
        self.valid_until = Some(unix_secs);
        self
    }

    /// Build the unsigned envelope.
    pub fn build(self) -> Result<TransactionEnvelope, Error> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let max_time = match self.valid_until {
            Some(at) => at,
            None => {
                let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
                now.saturating_add(self.timeout.as_secs())
            }
        };

        let invoke = InvokeContractArgs {
            contract_address: self.contract.to_sc_address(),
            function_name: ScSymbol(StringM::try_from(self.function.as_str())?),
            args: self.args.try_into()?,
        };

        let operation = Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(invoke),
                auth: VecM::default(),
            }),
        };

        let tx = Transaction {
            source_account: self.account.key.to_muxed_account(),
            fee: self.fee.unwrap_or_else(|| self.call_class.base_fee()),
            seq_num: SequenceNumber(self.account.next_sequence()),
            cond: Preconditions::Time(TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(max_time),
            }),
            memo: Memo::None,
            operations: vec![operation].try_into()?,
            ext: TransactionExt::V0,
        };

        Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
            tx,
            signatures: VecM::default(),
        }))
    }
}

/// Parse a product identifier typed by a user.
///
/// Surrounding whitespace is ignored. Anything other than a plain decimal
/// `u64` is rejected, including signs and fractions.
pub fn parse_product_id(input: &str) -> Result<u64, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseProductIdError::Empty.into());
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseProductIdError::NotANumber(trimmed.to_string()).into());
    }
    trimmed
        .parse()
        .map_err(|_| ParseProductIdError::Overflow(trimmed.to_string()).into())
}
