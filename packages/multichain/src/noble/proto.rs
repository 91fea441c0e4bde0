//! Protobuf messages for hub-chain modules cosmrs does not ship.
//!
//! Field numbers match the on-chain protos: `circle.cctp.v1` (Noble's CCTP
//! module) and `ibc.applications.transfer.v1`. Each message knows its own
//! type URL so it can be packed into a `cosmrs::Any` for tx body assembly.

use cosmrs::Any;
use prost::Message;

pub const MSG_DEPOSIT_FOR_BURN_TYPE_URL: &str = "/circle.cctp.v1.MsgDepositForBurn";
pub const MSG_RECEIVE_MESSAGE_TYPE_URL: &str = "/circle.cctp.v1.MsgReceiveMessage";
pub const MSG_IBC_TRANSFER_TYPE_URL: &str = "/ibc.applications.transfer.v1.MsgTransfer";

/// `cosmos.base.v1beta1.Coin`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Coin {
    #[prost(string, tag = "1")]
    pub denom: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub amount: ::prost::alloc::string::String,
}

/// `ibc.core.client.v1.Height`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Height {
    #[prost(uint64, tag = "1")]
    pub revision_number: u64,
    #[prost(uint64, tag = "2")]
    pub revision_height: u64,
}

/// `circle.cctp.v1.MsgDepositForBurn`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgDepositForBurn {
    #[prost(string, tag = "1")]
    pub from: ::prost::alloc::string::String,
    /// Amount in base units, as a decimal string.
    #[prost(string, tag = "2")]
    pub amount: ::prost::alloc::string::String,
    #[prost(uint32, tag = "3")]
    pub destination_domain: u32,
    /// Canonical 32-byte recipient encoding.
    #[prost(bytes = "vec", tag = "4")]
    pub mint_recipient: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "5")]
    pub burn_token: ::prost::alloc::string::String,
}

impl MsgDepositForBurn {
    pub fn to_any(&self) -> Any {
        Any {
            type_url: MSG_DEPOSIT_FOR_BURN_TYPE_URL.to_string(),
            value: self.encode_to_vec(),
        }
    }
}

/// `circle.cctp.v1.MsgReceiveMessage`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgReceiveMessage {
    #[prost(string, tag = "1")]
    pub from: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub message: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub attestation: ::prost::alloc::vec::Vec<u8>,
}

impl MsgReceiveMessage {
    pub fn to_any(&self) -> Any {
        Any {
            type_url: MSG_RECEIVE_MESSAGE_TYPE_URL.to_string(),
            value: self.encode_to_vec(),
        }
    }
}

/// `ibc.applications.transfer.v1.MsgTransfer`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgIbcTransfer {
    #[prost(string, tag = "1")]
    pub source_port: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub source_channel: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub token: ::core::option::Option<Coin>,
    #[prost(string, tag = "4")]
    pub sender: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub receiver: ::prost::alloc::string::String,
    /// Zero height disables the height-based timeout; the timestamp below
    /// is the one that bounds the packet.
    #[prost(message, optional, tag = "6")]
    pub timeout_height: ::core::option::Option<Height>,
    /// Unix timestamp in nanoseconds after which the packet times out.
    #[prost(uint64, tag = "7")]
    pub timeout_timestamp: u64,
    #[prost(string, tag = "8")]
    pub memo: ::prost::alloc::string::String,
}

impl MsgIbcTransfer {
    pub fn to_any(&self) -> Any {
        Any {
            type_url: MSG_IBC_TRANSFER_TYPE_URL.to_string(),
            value: self.encode_to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_for_burn_round_trip() {
        let msg = MsgDepositForBurn {
            from: "noble1k74p0mrdm2a94u7kqpcrfv5lxwnd5wh6uruqln".to_string(),
            amount: "1000000".to_string(),
            destination_domain: 0,
            mint_recipient: vec![0u8; 32],
            burn_token: "uusdc".to_string(),
        };

        let any = msg.to_any();
        assert_eq!(any.type_url, MSG_DEPOSIT_FOR_BURN_TYPE_URL);

        let decoded = MsgDepositForBurn::decode(any.value.as_slice()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_ibc_transfer_encodes_timeout() {
        let msg = MsgIbcTransfer {
            source_port: "transfer".to_string(),
            source_channel: "channel-81".to_string(),
            token: Some(Coin {
                denom: "uusdc".to_string(),
                amount: "50000".to_string(),
            }),
            sender: "noble1k74p0mrdm2a94u7kqpcrfv5lxwnd5wh6uruqln".to_string(),
            receiver: "jolt1xyz".to_string(),
            timeout_height: None,
            timeout_timestamp: 1_700_000_000_000_000_000,
            memo: String::new(),
        };

        let decoded = MsgIbcTransfer::decode(msg.to_any().value.as_slice()).unwrap();
        assert_eq!(decoded.timeout_timestamp, 1_700_000_000_000_000_000);
        assert_eq!(decoded.token.unwrap().amount, "50000");
    }
}
