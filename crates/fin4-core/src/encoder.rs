//! Call encoding.
//!
//! Turns `(contract handle, method name, arguments)` into the exact wire
//! payload a contract expects: the 4-byte selector of the method's canonical
//! signature followed by the ABI-encoded parameters. Alongside it the
//! encoder renders a display signature such as
//! `Fin4Claiming.submitClaim(0x12..,[1,2])`, which is only ever logged or
//! shown to the user.

use std::fmt;
use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, Bytes, Selector, B256, I256, U256};
use fin4_transport::CallRequest;

use crate::abi::MethodEntry;
use crate::error::{CoreError, Result};
use crate::registry::ContractHandle;

/// One actual parameter as supplied by a caller.
///
/// `Text` is coerced against the method's declared type at encoding time,
/// so `"100"` works for a `uint256` and `"0xab.."` for an `address`.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    Text(String),
    Value(DynSolValue),
    List(Vec<CallArg>),
}

impl From<&str> for CallArg {
    fn from(s: &str) -> Self {
        CallArg::Text(s.to_string())
    }
}

impl From<String> for CallArg {
    fn from(s: String) -> Self {
        CallArg::Text(s)
    }
}

impl From<DynSolValue> for CallArg {
    fn from(v: DynSolValue) -> Self {
        CallArg::Value(v)
    }
}

impl From<Address> for CallArg {
    fn from(a: Address) -> Self {
        CallArg::Value(DynSolValue::Address(a))
    }
}

impl From<U256> for CallArg {
    fn from(u: U256) -> Self {
        CallArg::Value(DynSolValue::Uint(u, 256))
    }
}

impl From<u64> for CallArg {
    fn from(u: u64) -> Self {
        CallArg::Value(DynSolValue::Uint(U256::from(u), 256))
    }
}

impl From<bool> for CallArg {
    fn from(b: bool) -> Self {
        CallArg::Value(DynSolValue::Bool(b))
    }
}

impl From<B256> for CallArg {
    fn from(b: B256) -> Self {
        CallArg::Value(DynSolValue::FixedBytes(b, 32))
    }
}

impl<T: Into<CallArg>> From<Vec<T>> for CallArg {
    fn from(items: Vec<T>) -> Self {
        CallArg::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for CallArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallArg::Text(s) => f.write_str(s),
            CallArg::Value(v) => f.write_str(&render_value(v)),
            CallArg::List(items) => {
                let inner: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", inner.join(","))
            }
        }
    }
}

fn render_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(a) => a.to_string(),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Bytes(b) => format!("0x{}", hex::encode(b)),
        DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let inner: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", inner.join(","))
        }
        DynSolValue::Tuple(items) => {
            let inner: Vec<String> = items.iter().map(render_value).collect();
            format!("({})", inner.join(","))
        }
        other => format!("{other:?}"),
    }
}

/// Actual parameters of one call: a lone scalar or an ordered sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum CallParams {
    Single(CallArg),
    Sequence(Vec<CallArg>),
}

impl CallParams {
    pub fn none() -> Self {
        CallParams::Sequence(Vec::new())
    }

    /// A single scalar becomes a one-element sequence.
    pub fn into_vec(self) -> Vec<CallArg> {
        match self {
            CallParams::Single(arg) => vec![arg],
            CallParams::Sequence(args) => args,
        }
    }
}

impl Default for CallParams {
    fn default() -> Self {
        Self::none()
    }
}

impl From<()> for CallParams {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

impl From<Vec<CallArg>> for CallParams {
    fn from(args: Vec<CallArg>) -> Self {
        CallParams::Sequence(args)
    }
}

macro_rules! single_param {
    ($($ty:ty),*) => {
        $(impl From<$ty> for CallParams {
            fn from(v: $ty) -> Self {
                CallParams::Single(v.into())
            }
        })*
    };
}

single_param!(CallArg, &str, String, Address, U256, u64, bool, B256, DynSolValue);

/// The wire payload: selector then encoded parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
    pub selector: Selector,
    pub data: Bytes,
}

/// A method invocation against a registered contract, before encoding.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    pub contract: Arc<ContractHandle>,
    pub method: String,
    pub params: Vec<CallArg>,
}

impl CallDescriptor {
    pub fn new(
        contract: Arc<ContractHandle>,
        method: impl Into<String>,
        params: impl Into<CallParams>,
    ) -> Self {
        Self {
            contract,
            method: method.into(),
            params: params.into().into_vec(),
        }
    }
}

/// An encoded call ready for simulation, reading or submission.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    pub contract: Arc<ContractHandle>,
    pub method: MethodEntry,
    pub values: Vec<DynSolValue>,
    pub encoded: EncodedCall,
    /// Display signature, never sent over the wire.
    pub signature: String,
}

impl PreparedCall {
    pub fn to_request(&self, from: Address) -> CallRequest {
        CallRequest {
            from,
            to: self.contract.address,
            data: self.encoded.data.clone(),
        }
    }
}

/// Encode `descriptor` against its contract's method table.
pub fn encode_call(descriptor: &CallDescriptor) -> Result<PreparedCall> {
    let contract = &descriptor.contract;
    let method = contract.method(&descriptor.method)?;

    if method.inputs.len() != descriptor.params.len() {
        return Err(CoreError::ArgumentCount {
            contract: contract.name.clone(),
            method: method.name.clone(),
            expected: method.inputs.len(),
            got: descriptor.params.len(),
        });
    }

    let values = method
        .inputs
        .iter()
        .zip(&descriptor.params)
        .enumerate()
        .map(|(index, (ty, arg))| {
            coerce(arg, ty).map_err(|reason| CoreError::ArgumentEncoding {
                contract: contract.name.clone(),
                method: method.name.clone(),
                index,
                reason,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let params = DynSolValue::Tuple(values.clone()).abi_encode_params();
    let mut data = Vec::with_capacity(4 + params.len());
    data.extend_from_slice(method.selector.as_slice());
    data.extend_from_slice(&params);

    Ok(PreparedCall {
        contract: contract.clone(),
        method: method.clone(),
        values,
        encoded: EncodedCall {
            selector: method.selector,
            data: data.into(),
        },
        signature: render_signature(&contract.name, &method.name, &descriptor.params),
    })
}

/// `Contract.method(a,b,[c,d])`.
pub fn render_signature(contract: &str, method: &str, params: &[CallArg]) -> String {
    let args: Vec<String> = params.iter().map(ToString::to_string).collect();
    format!("{contract}.{method}({})", args.join(","))
}

fn coerce(arg: &CallArg, ty: &DynSolType) -> std::result::Result<DynSolValue, String> {
    match arg {
        CallArg::Text(s) => ty.coerce_str(s).map_err(|e| e.to_string()),
        CallArg::Value(v) => {
            if ty.matches(v) {
                Ok(v.clone())
            } else if let Some(fitted) = fit_integer(v, ty) {
                fitted
            } else {
                Err(format!("expected {}, got {}", ty.sol_type_name(), render_value(v)))
            }
        }
        CallArg::List(items) => match ty {
            DynSolType::Array(inner) => items
                .iter()
                .map(|item| coerce(item, inner))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(DynSolValue::Array),
            DynSolType::FixedArray(inner, len) if items.len() == *len => items
                .iter()
                .map(|item| coerce(item, inner))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray),
            DynSolType::Tuple(types) if items.len() == types.len() => items
                .iter()
                .zip(types)
                .map(|(item, ty)| coerce(item, ty))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple),
            other => Err(format!(
                "a list of {} values does not fit {}",
                items.len(),
                other.sol_type_name()
            )),
        },
    }
}

/// Re-tag an integer built at one width (`From<u64>` always yields
/// `uint256`) with the declared width, if the value is in range.
fn fit_integer(value: &DynSolValue, ty: &DynSolType) -> Option<std::result::Result<DynSolValue, String>> {
    let out_of_range = |v: &dyn fmt::Display| -> std::result::Result<DynSolValue, String> {
        Err(format!("{v} is out of range for {}", ty.sol_type_name()))
    };
    match (value, ty) {
        (DynSolValue::Uint(u, _), DynSolType::Uint(bits)) => Some(if u.bit_len() <= *bits {
            Ok(DynSolValue::Uint(*u, *bits))
        } else {
            out_of_range(u)
        }),
        (DynSolValue::Uint(u, _), DynSolType::Int(bits)) => Some(if u.bit_len() < *bits {
            Ok(DynSolValue::Int(I256::from_raw(*u), *bits))
        } else {
            out_of_range(u)
        }),
        (DynSolValue::Int(i, _), DynSolType::Int(bits)) => {
            let magnitude = if i.is_negative() {
                i.unsigned_abs() - U256::from(1u8)
            } else {
                i.unsigned_abs()
            };
            Some(if magnitude.bit_len() < *bits {
                Ok(DynSolValue::Int(*i, *bits))
            } else {
                out_of_range(i)
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::InterfaceDescription;
    use crate::registry::ContractRegistry;

    fn token_contract() -> Arc<ContractHandle> {
        let interface = InterfaceDescription::parse(
            "GOV",
            &[
                "function transfer(address to, uint256 amount) returns (bool)",
                "function addVerifiers(address token, address[] verifiers)",
                "function ping()",
                "function setDecimals(uint8 decimals)",
                "function shift(int32 offset)",
            ],
        )
        .unwrap();
        ContractRegistry::new().register(
            "GOV",
            Address::repeat_byte(0x60),
            Arc::new(interface),
            vec![],
        )
    }

    #[test]
    fn test_transfer_layout_is_selector_then_padded_args() {
        let to: Address = "0xabcd000000000000000000000000000000001234".parse().unwrap();
        let call = CallDescriptor::new(
            token_contract(),
            "transfer",
            vec![CallArg::from(to), CallArg::from(100u64)],
        );
        let prepared = encode_call(&call).unwrap();
        let data = prepared.encoded.data.as_ref();

        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..36], to.as_slice());
        assert_eq!(U256::from_be_slice(&data[36..68]), U256::from(100));
    }

    #[test]
    fn test_text_arguments_are_coerced_to_declared_types() {
        let call = CallDescriptor::new(
            token_contract(),
            "transfer",
            vec![
                CallArg::from("0xabcd000000000000000000000000000000001234"),
                CallArg::from("100"),
            ],
        );
        let typed = CallDescriptor::new(
            token_contract(),
            "transfer",
            vec![
                CallArg::from(
                    "0xabcd000000000000000000000000000000001234"
                        .parse::<Address>()
                        .unwrap(),
                ),
                CallArg::from(U256::from(100)),
            ],
        );
        assert_eq!(
            encode_call(&call).unwrap().encoded,
            encode_call(&typed).unwrap().encoded
        );
    }

    #[test]
    fn test_selector_maps_back_to_method() {
        let contract = token_contract();
        for name in ["transfer", "addVerifiers", "ping", "setDecimals", "shift"] {
            let method = contract.method(name).unwrap();
            let args: Vec<CallArg> = method
                .inputs
                .iter()
                .map(|ty| match ty {
                    DynSolType::Array(_) => CallArg::List(vec![]),
                    DynSolType::Address => CallArg::from(Address::ZERO),
                    _ => CallArg::from(1u64),
                })
                .collect();
            let prepared =
                encode_call(&CallDescriptor::new(contract.clone(), name, args)).unwrap();
            let decoded = contract
                .interface
                .method_by_selector(&prepared.encoded.selector)
                .unwrap();
            assert_eq!(decoded.name, name);
        }
    }

    #[test]
    fn test_single_scalar_is_normalized_to_sequence() {
        assert_eq!(
            CallParams::from(7u64).into_vec(),
            vec![CallArg::from(7u64)]
        );
        assert!(CallParams::from(()).into_vec().is_empty());
    }

    #[test]
    fn test_signature_renders_lists_in_brackets() {
        let signature = render_signature(
            "Fin4Verifying",
            "addVerifiers",
            &[
                CallArg::from("0x01"),
                CallArg::from(vec![CallArg::from(1u64), CallArg::from(2u64)]),
            ],
        );
        assert_eq!(signature, "Fin4Verifying.addVerifiers(0x01,[1,2])");

        let prepared = encode_call(&CallDescriptor::new(token_contract(), "ping", ())).unwrap();
        assert_eq!(prepared.signature, "GOV.ping()");
        assert_eq!(prepared.encoded.data.len(), 4);
    }

    #[test]
    fn test_unknown_method_and_bad_arguments() {
        let contract = token_contract();
        let err = encode_call(&CallDescriptor::new(contract.clone(), "mint", ())).unwrap_err();
        assert!(matches!(err, CoreError::UnknownMethod { .. }));

        let err = encode_call(&CallDescriptor::new(contract.clone(), "transfer", 5u64)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ArgumentCount {
                expected: 2,
                got: 1,
                ..
            }
        ));

        let err = encode_call(&CallDescriptor::new(
            contract,
            "transfer",
            vec![CallArg::from("not an address"), CallArg::from(1u64)],
        ))
        .unwrap_err();
        assert!(matches!(err, CoreError::ArgumentEncoding { index: 0, .. }));
    }

    #[test]
    fn test_typed_integers_fit_narrower_declared_widths() {
        let contract = token_contract();
        let prepared =
            encode_call(&CallDescriptor::new(contract.clone(), "setDecimals", 18u64)).unwrap();
        assert_eq!(U256::from_be_slice(&prepared.encoded.data[4..36]), U256::from(18));
        assert_eq!(
            prepared.encoded,
            encode_call(&CallDescriptor::new(contract.clone(), "setDecimals", "18"))
                .unwrap()
                .encoded
        );

        let err =
            encode_call(&CallDescriptor::new(contract.clone(), "setDecimals", 256u64)).unwrap_err();
        assert!(matches!(err, CoreError::ArgumentEncoding { index: 0, .. }));

        let prepared = encode_call(&CallDescriptor::new(contract.clone(), "shift", 7u64)).unwrap();
        assert_eq!(U256::from_be_slice(&prepared.encoded.data[4..36]), U256::from(7));

        let negative = DynSolValue::Int(I256::try_from(-5i64).unwrap(), 256);
        let prepared = encode_call(&CallDescriptor::new(contract, "shift", negative)).unwrap();
        let mut expected = [0xffu8; 32];
        expected[31] = 0xfb;
        assert_eq!(&prepared.encoded.data[4..36], &expected[..]);
    }
}
