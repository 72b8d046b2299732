use radius_proto::{AttributeValue, Code, Dictionary, Packet};
use std::sync::Arc;

/// A verified reply from the server
#[derive(Debug, Clone)]
pub struct Reply {
    packet: Packet,
    dictionary: Arc<Dictionary>,
}

impl Reply {
    pub(crate) fn new(packet: Packet, dictionary: Arc<Dictionary>) -> Self {
        Reply { packet, dictionary }
    }

    pub fn code(&self) -> Code {
        self.packet.code
    }

    pub fn identifier(&self) -> u8 {
        self.packet.identifier
    }

    pub fn is_accept(&self) -> bool {
        self.packet.code == Code::AccessAccept
    }

    /// All values of `name`, in wire order; empty if absent or unknown
    pub fn get(&self, name: &str) -> Vec<AttributeValue> {
        self.packet.values(&self.dictionary, name)
    }

    /// First value of `name`
    pub fn first(&self, name: &str) -> Option<AttributeValue> {
        self.get(name).into_iter().next()
    }

    /// Every attribute as (name, value), in wire order
    pub fn attributes(&self) -> Vec<(String, AttributeValue)> {
        self.packet
            .typed_attributes(&self.dictionary)
            .into_iter()
            .map(|typed| (typed.name(), typed.value))
            .collect()
    }

    pub fn packet(&self) -> &Packet {
        &self.packet
    }
}
