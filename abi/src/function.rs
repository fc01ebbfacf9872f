use crate::{decode, encode, keccak256, Error, ParamType, Result, Token};

/// First four bytes of the keccak-256 hash of a canonical signature such as
/// `vote(uint64,uint8)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// A contract function with its declared inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<ParamType>,
    pub outputs: Vec<ParamType>,
}

impl Function {
    pub fn new(name: impl Into<String>, inputs: Vec<ParamType>, outputs: Vec<ParamType>) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
        }
    }

    pub fn signature(&self) -> String {
        let inputs = self
            .inputs
            .iter()
            .map(ParamType::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({inputs})", self.name)
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.signature())
    }

    /// Selector followed by the encoded arguments. Every argument must match the
    /// declared input at the same position.
    pub fn encode_call(&self, args: &[Token]) -> Result<Vec<u8>> {
        if args.len() != self.inputs.len() {
            return Err(Error::ArgumentCount {
                expected: self.inputs.len(),
                found: args.len(),
            });
        }

        for (index, (arg, ty)) in args.iter().zip(&self.inputs).enumerate() {
            if !arg.type_check(ty) {
                let found = arg.param_type();
                if &found == ty {
                    return Err(Error::ValueOutOfRange { ty: ty.to_string() });
                }
                return Err(Error::TypeMismatch {
                    index,
                    expected: ty.to_string(),
                    found: found.to_string(),
                });
            }
        }

        let mut out = self.selector().to_vec();
        out.extend(encode(args));
        Ok(out)
    }

    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Token>> {
        decode(&self.outputs, data)
    }
}
