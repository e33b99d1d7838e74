// Handshake message layer (RFC 5246 7.4).

use bytes::Bytes;

use crate::cipher_suite::CipherSuite;
use crate::error::{Error, Result};
use crate::extensions::Extension;
use crate::parsing::{serialize_varlen_vector, Reader, U16_LIMIT, U24_LIMIT, U8_LIMIT};

/// The negotiated protocol versions this implementation speaks, ordered by
/// wire value (0x0301 < 0x0302 < 0x0303).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    Tls10,
    Tls11,
    Tls12,
}

impl ProtocolVersion {
    pub fn to_u16(&self) -> u16 {
        match self {
            ProtocolVersion::Tls10 => 0x0301,
            ProtocolVersion::Tls11 => 0x0302,
            ProtocolVersion::Tls12 => 0x0303,
        }
    }

    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0x0301 => Some(ProtocolVersion::Tls10),
            0x0302 => Some(ProtocolVersion::Tls11),
            0x0303 => Some(ProtocolVersion::Tls12),
            _ => None,
        }
    }

    pub fn parse(r: &mut Reader) -> Result<Self> {
        Self::from_u16(r.next_u16()?)
            .ok_or(Error::UnexpectedMessage("unsupported protocol version"))
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_u16().to_be_bytes());
    }
}

tls_enum_u8!(HandshakeType => {
    HelloRequest(0),
    ClientHello(1),
    ServerHello(2),
    Certificate(11),
    ServerKeyExchange(12),
    ServerHelloDone(14),
    ClientKeyExchange(16),
    Finished(20),
    (255)
});

/// Number of bytes of the complete handshake message starting at `buf`, once
/// the four byte header has fully arrived.
pub fn message_length(buf: &[u8]) -> Option<usize> {
    if buf.len() < 4 {
        return None;
    }
    let len = u32::from_be_bytes([0, buf[1], buf[2], buf[3]]) as usize;
    Some(4 + len)
}

#[derive(Debug)]
pub enum Handshake {
    HelloRequest,
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    Certificate(Certificate),
    ServerKeyExchange(ServerKeyExchange),
    ServerHelloDone,
    ClientKeyExchange(ClientKeyExchange),
    Finished(Finished),
}

impl Handshake {
    /// Parses one framed handshake message (header included). Trailing bytes
    /// are rejected; reassembly happens above this layer.
    pub fn parse(raw: Bytes) -> Result<Self> {
        let mut r = Reader::new(raw);
        let typ = HandshakeType::parse(&mut r)?;
        let payload = r.varlen_vector(0, U24_LIMIT)?;
        r.expect_empty()?;

        let mut pr = Reader::new(payload);
        let msg = match typ {
            HandshakeType::HelloRequest => Handshake::HelloRequest,
            HandshakeType::ClientHello => Handshake::ClientHello(ClientHello::parse(&mut pr)?),
            HandshakeType::ServerHello => Handshake::ServerHello(ServerHello::parse(&mut pr)?),
            HandshakeType::Certificate => Handshake::Certificate(Certificate::parse(&mut pr)?),
            HandshakeType::ServerKeyExchange => Handshake::ServerKeyExchange(ServerKeyExchange {
                data: pr.take(pr.remaining())?,
            }),
            HandshakeType::ServerHelloDone => Handshake::ServerHelloDone,
            HandshakeType::ClientKeyExchange => Handshake::ClientKeyExchange(ClientKeyExchange {
                data: pr.take(pr.remaining())?,
            }),
            HandshakeType::Finished => Handshake::Finished(Finished {
                verify_data: pr.take(pr.remaining())?,
            }),
            HandshakeType::unknown(_) => {
                return Err(Error::UnexpectedMessage("unsupported handshake type"));
            }
        };
        pr.expect_empty()?;

        Ok(msg)
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        let typ = match self {
            Handshake::HelloRequest => HandshakeType::HelloRequest,
            Handshake::ClientHello(_) => HandshakeType::ClientHello,
            Handshake::ServerHello(_) => HandshakeType::ServerHello,
            Handshake::Certificate(_) => HandshakeType::Certificate,
            Handshake::ServerKeyExchange(_) => HandshakeType::ServerKeyExchange,
            Handshake::ServerHelloDone => HandshakeType::ServerHelloDone,
            Handshake::ClientKeyExchange(_) => HandshakeType::ClientKeyExchange,
            Handshake::Finished(_) => HandshakeType::Finished,
        };
        typ.serialize(out);

        serialize_varlen_vector(0, U24_LIMIT, out, |out| match self {
            Handshake::HelloRequest => {}
            Handshake::ClientHello(v) => v.serialize(out),
            Handshake::ServerHello(v) => v.serialize(out),
            Handshake::Certificate(v) => v.serialize(out),
            Handshake::ServerKeyExchange(v) => out.extend_from_slice(&v.data),
            Handshake::ServerHelloDone => {}
            Handshake::ClientKeyExchange(v) => out.extend_from_slice(&v.data),
            Handshake::Finished(v) => out.extend_from_slice(&v.verify_data),
        });
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut out = vec![];
        self.serialize(&mut out);
        Bytes::from(out)
    }
}

/// ClientHello (RFC 5246 7.4.1.2). `client_version` is kept as the raw wire
/// value: clients may legitimately offer a version we do not speak, and the
/// offered value is pinned into the RSA premaster secret check.
#[derive(Debug, Clone)]
pub struct ClientHello {
    pub client_version: u16,
    pub random: Bytes,
    pub session_id: Bytes,
    pub cipher_suites: Vec<CipherSuite>,
    pub compression_methods: Bytes,
    pub extensions: Vec<Extension>,
}

impl ClientHello {
    pub fn parse(r: &mut Reader) -> Result<Self> {
        let client_version = r.next_u16()?;
        let random = r.take(32)?;
        let session_id = r.varlen_vector(0, 32)?;

        let mut sr = Reader::new(r.varlen_vector(2, U16_LIMIT - 2)?);
        let mut cipher_suites = vec![];
        while !sr.is_empty() {
            cipher_suites.push(CipherSuite::parse(&mut sr)?);
        }

        let compression_methods = r.varlen_vector(1, U8_LIMIT)?;

        // TLS 1.0/1.1 clients may omit the extensions block entirely.
        let extensions = if r.is_empty() {
            vec![]
        } else {
            let mut er = Reader::new(r.varlen_vector(0, U16_LIMIT)?);
            r.expect_empty()?;

            let mut extensions = vec![];
            while !er.is_empty() {
                extensions.push(Extension::parse(&mut er)?);
            }
            extensions
        };

        Ok(Self {
            client_version,
            random,
            session_id,
            cipher_suites,
            compression_methods,
            extensions,
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        assert_eq!(self.random.len(), 32);
        out.extend_from_slice(&self.client_version.to_be_bytes());
        out.extend_from_slice(&self.random);
        serialize_varlen_vector(0, 32, out, |out| {
            out.extend_from_slice(&self.session_id);
        });
        serialize_varlen_vector(2, U16_LIMIT - 2, out, |out| {
            for suite in &self.cipher_suites {
                suite.serialize(out);
            }
        });
        serialize_varlen_vector(1, U8_LIMIT, out, |out| {
            out.extend_from_slice(&self.compression_methods);
        });
        if !self.extensions.is_empty() {
            serialize_varlen_vector(0, U16_LIMIT, out, |out| {
                for e in &self.extensions {
                    e.serialize(out);
                }
            });
        }
    }
}

/// ServerHello (RFC 5246 7.4.1.3).
#[derive(Debug, Clone)]
pub struct ServerHello {
    pub server_version: ProtocolVersion,
    pub random: Bytes,
    pub session_id: Bytes,
    pub cipher_suite: CipherSuite,
    pub compression_method: u8,
    pub extensions: Vec<Extension>,
}

impl ServerHello {
    pub fn parse(r: &mut Reader) -> Result<Self> {
        let server_version = ProtocolVersion::parse(r)?;
        let random = r.take(32)?;
        let session_id = r.varlen_vector(0, 32)?;
        let cipher_suite = CipherSuite::parse(r)?;
        let compression_method = r.next_u8()?;

        let extensions = if r.is_empty() {
            vec![]
        } else {
            let mut er = Reader::new(r.varlen_vector(0, U16_LIMIT)?);
            r.expect_empty()?;

            let mut extensions = vec![];
            while !er.is_empty() {
                extensions.push(Extension::parse(&mut er)?);
            }
            extensions
        };

        Ok(Self {
            server_version,
            random,
            session_id,
            cipher_suite,
            compression_method,
            extensions,
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        assert_eq!(self.random.len(), 32);
        self.server_version.serialize(out);
        out.extend_from_slice(&self.random);
        serialize_varlen_vector(0, 32, out, |out| {
            out.extend_from_slice(&self.session_id);
        });
        self.cipher_suite.serialize(out);
        out.push(self.compression_method);
        if !self.extensions.is_empty() {
            serialize_varlen_vector(0, U16_LIMIT, out, |out| {
                for e in &self.extensions {
                    e.serialize(out);
                }
            });
        }
    }
}

/// Certificate (RFC 5246 7.4.2): DER certificates, leaf first. The chain is
/// opaque here; X.509 parsing belongs to the caller.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub certificate_list: Vec<Bytes>,
}

impl Certificate {
    pub fn parse(r: &mut Reader) -> Result<Self> {
        let mut lr = Reader::new(r.varlen_vector(0, U24_LIMIT)?);
        let mut certificate_list = vec![];
        while !lr.is_empty() {
            certificate_list.push(lr.varlen_vector(1, U24_LIMIT)?);
        }
        Ok(Self { certificate_list })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        serialize_varlen_vector(0, U24_LIMIT, out, |out| {
            for cert in &self.certificate_list {
                serialize_varlen_vector(1, U24_LIMIT, out, |out| {
                    out.extend_from_slice(cert);
                });
            }
        });
    }
}

/// Raw ServerKeyExchange payload. The DH params and signature envelope are
/// version and key exchange dependent, so the bytes are kept opaque at this
/// layer (see key_exchange).
#[derive(Debug, Clone)]
pub struct ServerKeyExchange {
    pub data: Bytes,
}

/// Raw ClientKeyExchange payload: the RSA encrypted premaster secret or the
/// client's DH public value, interpreted by the negotiated key exchange.
#[derive(Debug, Clone)]
pub struct ClientKeyExchange {
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct Finished {
    pub verify_data: Bytes,
}
