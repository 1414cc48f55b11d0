//! Binary persistence for compiled flows, so a tenant's flow can be
//! validated once and loaded cheaply per worker.

use super::{CompiledFlow, CompiledNode, NodeIx};
use crate::error::ArtifactError;
use bincode::config::standard;
use bincode::de::{Decode, Decoder};
use bincode::enc::{Encode, Encoder};
use bincode::error::{DecodeError, EncodeError};
use bincode::{decode_from_slice, encode_to_vec};
use std::fs;
use std::path::Path;

// The id index is derived data; it is rebuilt on decode instead of stored.
impl Encode for CompiledFlow {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.nodes.encode(encoder)?;
        self.start.encode(encoder)?;
        self.settings.encode(encoder)?;
        self.version.encode(encoder)?;
        self.warnings.encode(encoder)?;
        Ok(())
    }
}

impl<Context> Decode<Context> for CompiledFlow {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let nodes: Vec<CompiledNode> = Decode::decode(decoder)?;
        let start = Decode::decode(decoder)?;
        let settings = Decode::decode(decoder)?;
        let version = Decode::decode(decoder)?;
        let warnings = Decode::decode(decoder)?;
        let index = nodes
            .iter()
            .enumerate()
            .map(|(ix, node)| (node.id.clone(), ix as NodeIx))
            .collect();
        Ok(Self {
            nodes,
            start,
            index,
            settings,
            version,
            warnings,
        })
    }
}

impl CompiledFlow {
    /// Serializes the compiled flow to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard()).map_err(|e| ArtifactError::Encode(e.to_string()))
    }

    /// Saves the compiled flow to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| ArtifactError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Loads a compiled flow from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| ArtifactError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Deserializes a compiled flow from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(flow, _)| flow) // bincode 2 returns a tuple (data, bytes_read)
            .map_err(|e| ArtifactError::Decode(e.to_string()))
    }
}
