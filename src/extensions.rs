// ClientHello/ServerHello extension codec. Only the extensions the handshake
// acts on are given structure; everything else is carried opaquely.
//
// server_name: RFC 6066 3. renegotiation_info: RFC 5746 3.2.
// signature_algorithms: RFC 5246 7.4.1.4.1.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::parsing::{serialize_varlen_vector, Reader, U16_LIMIT, U8_LIMIT};
use crate::signature::SignatureAndHashAlgorithm;

tls_enum_u16!(ExtensionType => {
    server_name(0),
    signature_algorithms(13),
    renegotiation_info(0xff01),
    (65535)
});

tls_enum_u8!(NameType => {
    host_name(0),
    (255)
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerName {
    pub typ: NameType,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extension {
    /// An empty name list is the server's acknowledgement form.
    ServerName(Vec<ServerName>),
    SignatureAlgorithms(Vec<SignatureAndHashAlgorithm>),
    RenegotiationInfo(Bytes),
    Unknown { typ: u16, data: Bytes },
}

impl Extension {
    pub fn parse(r: &mut Reader) -> Result<Self> {
        let typ = r.next_u16()?;
        let data = r.varlen_vector(0, U16_LIMIT)?;
        let mut dr = Reader::new(data.clone());

        let ext = match ExtensionType::from_u16(typ) {
            ExtensionType::server_name => {
                if dr.is_empty() {
                    Extension::ServerName(vec![])
                } else {
                    let mut lr = Reader::new(dr.varlen_vector(1, U16_LIMIT)?);
                    dr.expect_empty()?;

                    let mut names = vec![];
                    while !lr.is_empty() {
                        let typ = NameType::parse(&mut lr)?;
                        let data = lr.varlen_vector(1, U16_LIMIT)?;
                        names.push(ServerName { typ, data });
                    }
                    Extension::ServerName(names)
                }
            }
            ExtensionType::signature_algorithms => {
                let mut lr = Reader::new(dr.varlen_vector(2, U16_LIMIT - 2)?);
                dr.expect_empty()?;

                let mut algorithms = vec![];
                while !lr.is_empty() {
                    algorithms.push(SignatureAndHashAlgorithm::parse(&mut lr)?);
                }
                Extension::SignatureAlgorithms(algorithms)
            }
            ExtensionType::renegotiation_info => {
                let value = dr.varlen_vector(0, U8_LIMIT)?;
                dr.expect_empty()?;
                Extension::RenegotiationInfo(value)
            }
            ExtensionType::unknown(typ) => Extension::Unknown { typ, data },
        };

        Ok(ext)
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        let typ = match self {
            Extension::ServerName(_) => ExtensionType::server_name,
            Extension::SignatureAlgorithms(_) => ExtensionType::signature_algorithms,
            Extension::RenegotiationInfo(_) => ExtensionType::renegotiation_info,
            Extension::Unknown { typ, .. } => ExtensionType::unknown(*typ),
        };
        typ.serialize(out);

        serialize_varlen_vector(0, U16_LIMIT, out, |out| match self {
            Extension::ServerName(names) => {
                if !names.is_empty() {
                    serialize_varlen_vector(1, U16_LIMIT, out, |out| {
                        for name in names {
                            name.typ.serialize(out);
                            serialize_varlen_vector(1, U16_LIMIT, out, |out| {
                                out.extend_from_slice(&name.data);
                            });
                        }
                    });
                }
            }
            Extension::SignatureAlgorithms(algorithms) => {
                serialize_varlen_vector(2, U16_LIMIT - 2, out, |out| {
                    for a in algorithms {
                        a.serialize(out);
                    }
                });
            }
            Extension::RenegotiationInfo(value) => {
                serialize_varlen_vector(0, U8_LIMIT, out, |out| {
                    out.extend_from_slice(value);
                });
            }
            Extension::Unknown { data, .. } => {
                out.extend_from_slice(data);
            }
        });
    }
}

pub fn find_server_name(extensions: &[Extension]) -> Option<&[ServerName]> {
    for e in extensions {
        if let Extension::ServerName(v) = e {
            return Some(v);
        }
    }
    None
}

pub fn find_signature_algorithms(extensions: &[Extension]) -> Option<&[SignatureAndHashAlgorithm]> {
    for e in extensions {
        if let Extension::SignatureAlgorithms(v) = e {
            return Some(v);
        }
    }
    None
}

pub fn find_renegotiation_info(extensions: &[Extension]) -> Option<&Bytes> {
    for e in extensions {
        if let Extension::RenegotiationInfo(v) = e {
            return Some(v);
        }
    }
    None
}

/// The first host_name entry of the client's server_name extension, if any.
pub fn requested_hostname(extensions: &[Extension]) -> Result<Option<String>> {
    let names = match find_server_name(extensions) {
        Some(v) => v,
        None => return Ok(None),
    };

    for name in names {
        if name.typ == NameType::host_name {
            let s = std::str::from_utf8(&name.data)
                .map_err(|_| Error::HandshakeFailure("host_name is not valid ASCII"))?;
            return Ok(Some(s.to_string()));
        }
    }

    Ok(None)
}
