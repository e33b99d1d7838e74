// The server-side handshake state machine.
//
// Pure and sans-IO: the record layer hands in decoded handshake or
// ChangeCipherSpec payloads, and gets back the ordered records to transmit
// plus directives for swapping the record protection contexts. Each call
// consumes one delivery and either advances the machine or fails fatally;
// there is no retry and no partial progress.

use std::sync::Arc;

use bytes::Bytes;
use log::debug;
use subtle::ConstantTimeEq;

use crate::cipher::CipherEndpointSpec;
use crate::cipher_suite::{CipherSuite, CipherSuiteParts, KeyExchange};
use crate::dh::{oakley_group2, DhSecret};
use crate::epoch::{Epoch, HandshakeParams, RenegData};
use crate::error::{Error, Result};
use crate::extensions::{
    find_renegotiation_info, find_server_name, find_signature_algorithms, requested_hostname,
    Extension,
};
use crate::handshake::{
    message_length, Certificate, ClientHello, Finished, Handshake, ProtocolVersion, ServerHello,
    ServerKeyExchange,
};
use crate::key_exchange::{
    build_server_key_exchange, derive_cipher_contexts, dhe_pre_master_secret,
    rsa_pre_master_secret, serialize_server_dh_params,
};
use crate::options::ServerOptions;
use crate::prf::finished_verify_data;
use crate::random::secure_random_bytes;
use crate::record::{ContentType, Output, CHANGE_CIPHER_SPEC_BODY};
use crate::transcript::Transcript;

/// Where the handshake currently stands. Each variant carries exactly the
/// data its transitions need, so an out-of-order message has nothing to act
/// on.
pub enum ServerState {
    AwaitClientHello,
    AwaitClientKeyExchangeRsa {
        epoch: Epoch,
        params: HandshakeParams,
        transcript: Transcript,
    },
    AwaitClientKeyExchangeDhe {
        epoch: Epoch,
        params: HandshakeParams,
        secret: DhSecret,
        transcript: Transcript,
    },
    AwaitChangeCipherSpec {
        epoch: Epoch,
        server_write: CipherEndpointSpec,
        client_read: CipherEndpointSpec,
        transcript: Transcript,
    },
    AwaitFinished {
        epoch: Epoch,
        transcript: Transcript,
    },
    Established,
}

/// The session-level epoch: nothing before the first handshake completes
/// (tagged with the highest configured version for the record layer's
/// benefit), the negotiated epoch afterwards.
pub enum SessionEpoch {
    Initial(ProtocolVersion),
    Established(Epoch),
}

pub struct ServerConnection {
    options: Arc<ServerOptions>,
    state: ServerState,
    epoch: SessionEpoch,

    /// Handshake bytes received but not yet consumed as a complete message.
    /// Must be empty at the ChangeCipherSpec and Finished boundaries.
    hs_fragment: Vec<u8>,
}

impl ServerConnection {
    pub fn new(options: Arc<ServerOptions>) -> Self {
        let initial_version = options
            .protocol_versions
            .iter()
            .copied()
            .max()
            .unwrap_or(ProtocolVersion::Tls12);

        Self {
            options,
            state: ServerState::AwaitClientHello,
            epoch: SessionEpoch::Initial(initial_version),
            hs_fragment: vec![],
        }
    }

    pub fn is_established(&self) -> bool {
        matches!(self.state, ServerState::Established)
    }

    /// The epoch of the last completed handshake.
    pub fn session_epoch(&self) -> Option<&Epoch> {
        match &self.epoch {
            SessionEpoch::Established(e) => Some(e),
            SessionEpoch::Initial(_) => None,
        }
    }

    /// Consumes handshake record content. Complete messages are processed in
    /// order; a trailing partial message is buffered for the next delivery.
    pub fn handle_handshake(&mut self, data: &[u8]) -> Result<Vec<Output>> {
        self.hs_fragment.extend_from_slice(data);

        let mut outputs = vec![];
        while let Some(total) = message_length(&self.hs_fragment) {
            if self.hs_fragment.len() < total {
                break;
            }
            let rest = self.hs_fragment.split_off(total);
            let raw = Bytes::from(std::mem::replace(&mut self.hs_fragment, rest));
            outputs.extend(self.process_message(raw)?);
        }

        Ok(outputs)
    }

    /// Consumes the ChangeCipherSpec payload, which arrives on its own
    /// content type and never enters the transcript. On success the caller
    /// receives the records to send (our own ChangeCipherSpec), the outbound
    /// context swap barrier, and the inbound context to apply before
    /// decrypting the next record.
    pub fn handle_change_cipher_spec(
        &mut self,
        data: &[u8],
    ) -> Result<(Vec<Output>, CipherEndpointSpec)> {
        if data != CHANGE_CIPHER_SPEC_BODY {
            return Err(Error::UnexpectedMessage("malformed ChangeCipherSpec"));
        }
        if !self.hs_fragment.is_empty() {
            return Err(Error::UnexpectedMessage(
                "handshake data trailing a flight boundary",
            ));
        }

        match std::mem::replace(&mut self.state, ServerState::AwaitClientHello) {
            ServerState::AwaitChangeCipherSpec {
                epoch,
                server_write,
                client_read,
                transcript,
            } => {
                self.state = ServerState::AwaitFinished { epoch, transcript };
                let outputs = vec![
                    Output::Record(
                        ContentType::change_cipher_spec,
                        Bytes::from_static(CHANGE_CIPHER_SPEC_BODY),
                    ),
                    Output::ChangeEncryption(server_write),
                ];
                Ok((outputs, client_read))
            }
            state => {
                self.state = state;
                Err(Error::UnexpectedMessage(
                    "ChangeCipherSpec arrived out of order",
                ))
            }
        }
    }

    /// Asks the client to renegotiate by emitting a HelloRequest. The
    /// request is advisory and not part of the next handshake's transcript.
    pub fn request_renegotiation(&self) -> Result<Vec<Output>> {
        if !self.options.use_reneg {
            return Err(Error::HandshakeFailure("renegotiation is disabled"));
        }
        match self.state {
            ServerState::Established => Ok(vec![Output::Record(
                ContentType::handshake,
                Handshake::HelloRequest.to_bytes(),
            )]),
            _ => Err(Error::HandshakeFailure(
                "HelloRequest requires an established session",
            )),
        }
    }

    fn process_message(&mut self, raw: Bytes) -> Result<Vec<Output>> {
        let msg = Handshake::parse(raw.clone())?;

        let state = std::mem::replace(&mut self.state, ServerState::AwaitClientHello);
        let (next, outputs) = match (state, msg) {
            (ServerState::AwaitClientHello, Handshake::ClientHello(hello)) => {
                self.handle_client_hello(hello, raw)?
            }
            (
                ServerState::AwaitClientKeyExchangeRsa {
                    epoch,
                    params,
                    transcript,
                },
                Handshake::ClientKeyExchange(cke),
            ) => {
                let pair = self
                    .options
                    .own_certificate
                    .as_ref()
                    .ok_or(Error::HandshakeFailure("no certificate configured"))?;
                let pms =
                    rsa_pre_master_secret(&pair.private_key, params.client_version, &cke.data)?;
                finish_key_exchange(epoch, &params, transcript, raw, &pms[..])?
            }
            (
                ServerState::AwaitClientKeyExchangeDhe {
                    epoch,
                    params,
                    secret,
                    transcript,
                },
                Handshake::ClientKeyExchange(cke),
            ) => {
                let pms = dhe_pre_master_secret(&oakley_group2(), &secret, &cke.data)?;
                finish_key_exchange(epoch, &params, transcript, raw, &pms)?
            }
            (ServerState::AwaitFinished { epoch, transcript }, Handshake::Finished(fin)) => {
                self.handle_finished(epoch, transcript, fin, raw)?
            }
            (ServerState::Established, Handshake::ClientHello(hello)) => {
                self.handle_renegotiation(hello, raw)?
            }
            (state, _) => {
                self.state = state;
                return Err(Error::HandshakeFailure(
                    "handshake message arrived out of order",
                ));
            }
        };

        self.state = next;
        Ok(outputs)
    }

    fn handle_client_hello(
        &self,
        hello: ClientHello,
        raw: Bytes,
    ) -> Result<(ServerState, Vec<Output>)> {
        validate_client_hello(&hello)?;

        let version = self.negotiate_version(hello.client_version)?;

        // RFC 5746 3.6: the initial hello must signal renegotiation support
        // (empty extension or SCSV) when we require it, and a non-empty
        // extension value here means the client thinks it is renegotiating.
        let scsv = hello
            .cipher_suites
            .contains(&CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV);
        match find_renegotiation_info(&hello.extensions) {
            Some(data) if !data.is_empty() => {
                return Err(Error::HandshakeFailure(
                    "renegotiation data on an initial handshake",
                ));
            }
            Some(_) => {}
            None if scsv || !self.options.secure_reneg => {}
            None => {
                return Err(Error::HandshakeFailure(
                    "client does not signal secure renegotiation",
                ));
            }
        }

        let (suite, parts) = self.negotiate_cipher(&hello.cipher_suites, version)?;
        debug!(
            "negotiated {:?} with {:?} on the initial handshake",
            version, suite
        );

        self.first_flight(version, suite, parts, &hello, raw, Bytes::new())
    }

    fn handle_renegotiation(
        &self,
        hello: ClientHello,
        raw: Bytes,
    ) -> Result<(ServerState, Vec<Output>)> {
        if !self.options.use_reneg {
            return Err(Error::HandshakeFailure("renegotiation is disabled"));
        }

        let (prior_version, reneg) = match &self.epoch {
            SessionEpoch::Established(e) => (
                e.protocol_version,
                e.reneg
                    .clone()
                    .ok_or(Error::HandshakeFailure("no verify data bound to the session"))?,
            ),
            SessionEpoch::Initial(_) => {
                return Err(Error::HandshakeFailure(
                    "renegotiation without an established session",
                ));
            }
        };

        validate_client_hello(&hello)?;

        // RFC 5746 3.7: the renegotiating hello must carry the previous
        // client verify data, and must not fall back to the SCSV.
        if hello
            .cipher_suites
            .contains(&CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV)
        {
            return Err(Error::HandshakeFailure("SCSV inside a renegotiation"));
        }
        let their = find_renegotiation_info(&hello.extensions).ok_or(Error::HandshakeFailure(
            "renegotiation without the renegotiation_info extension",
        ))?;
        if !bool::from(their[..].ct_eq(&reneg.client_verify_data[..])) {
            return Err(Error::HandshakeFailure("renegotiation verify data mismatch"));
        }

        let version = self.negotiate_version(hello.client_version)?;
        if version != prior_version {
            return Err(Error::HandshakeFailure(
                "renegotiation changed the protocol version",
            ));
        }

        let (suite, parts) = self.negotiate_cipher(&hello.cipher_suites, version)?;
        debug!("renegotiating {:?} with {:?}", version, suite);

        let mut reneg_value = reneg.client_verify_data.to_vec();
        reneg_value.extend_from_slice(&reneg.server_verify_data);

        self.first_flight(version, suite, parts, &hello, raw, Bytes::from(reneg_value))
    }

    /// Emits ServerHello, Certificate, (ServerKeyExchange,) ServerHelloDone
    /// as one record and parks the machine waiting for the client's key
    /// exchange.
    fn first_flight(
        &self,
        version: ProtocolVersion,
        suite: CipherSuite,
        parts: CipherSuiteParts,
        hello: &ClientHello,
        raw_hello: Bytes,
        reneg_value: Bytes,
    ) -> Result<(ServerState, Vec<Output>)> {
        let pair = self
            .options
            .own_certificate
            .as_ref()
            .ok_or(Error::HandshakeFailure("no certificate configured"))?;

        let mut server_random = vec![0u8; 32];
        secure_random_bytes(&mut server_random);
        let server_random = Bytes::from(server_random);

        let params = HandshakeParams {
            client_random: hello.random.clone(),
            server_random: server_random.clone(),
            client_version: hello.client_version,
        };

        let epoch = Epoch {
            protocol_version: version,
            cipher_suite: suite,
            server_name: requested_hostname(&hello.extensions)?,
            own_certificate: pair.chain.clone(),
            peer_certificate: vec![],
            master_secret: vec![],
            reneg: None,
        };

        let mut transcript = Transcript::new();
        transcript.push(raw_hello);

        let mut extensions = vec![Extension::RenegotiationInfo(reneg_value)];
        if find_server_name(&hello.extensions).is_some() {
            extensions.push(Extension::ServerName(vec![]));
        }

        let mut flight = vec![];
        let emit = |msg: Handshake, transcript: &mut Transcript, flight: &mut Vec<u8>| {
            let bytes = msg.to_bytes();
            transcript.push(bytes.clone());
            flight.extend_from_slice(&bytes);
        };

        emit(
            Handshake::ServerHello(ServerHello {
                server_version: version,
                random: server_random,
                session_id: Bytes::new(),
                cipher_suite: suite,
                compression_method: 0,
                extensions,
            }),
            &mut transcript,
            &mut flight,
        );

        emit(
            Handshake::Certificate(Certificate {
                certificate_list: pair.chain.clone(),
            }),
            &mut transcript,
            &mut flight,
        );

        let mut dhe_secret = None;
        if parts.key_exchange == KeyExchange::DheRsa {
            let group = oakley_group2();
            let secret = group.generate_secret();
            let public = group.public_value(&secret);

            let mut dh_params = vec![];
            serialize_server_dh_params(&group, &public, &mut dh_params);

            let data = build_server_key_exchange(
                version,
                &pair.private_key,
                find_signature_algorithms(&hello.extensions),
                &self.options.hashes,
                &params.client_random,
                &params.server_random,
                &dh_params,
            )?;

            emit(
                Handshake::ServerKeyExchange(ServerKeyExchange { data }),
                &mut transcript,
                &mut flight,
            );
            dhe_secret = Some(secret);
        }

        emit(Handshake::ServerHelloDone, &mut transcript, &mut flight);

        let outputs = vec![Output::Record(ContentType::handshake, Bytes::from(flight))];

        let state = match dhe_secret {
            Some(secret) => ServerState::AwaitClientKeyExchangeDhe {
                epoch,
                params,
                secret,
                transcript,
            },
            None => ServerState::AwaitClientKeyExchangeRsa {
                epoch,
                params,
                transcript,
            },
        };

        Ok((state, outputs))
    }

    fn handle_finished(
        &mut self,
        mut epoch: Epoch,
        mut transcript: Transcript,
        fin: Finished,
        raw: Bytes,
    ) -> Result<(ServerState, Vec<Output>)> {
        let parts = epoch.cipher_suite.decode()?;

        let expected = finished_verify_data(
            epoch.protocol_version,
            parts.prf_hash,
            &epoch.master_secret,
            b"client finished",
            &transcript,
        )?;
        if !bool::from(expected.ct_eq(&fin.verify_data[..])) {
            return Err(Error::HandshakeFailure("Finished verification failed"));
        }
        if !self.hs_fragment.is_empty() {
            return Err(Error::UnexpectedMessage(
                "handshake data trailing a flight boundary",
            ));
        }

        // The server's verify data covers the client Finished as well.
        transcript.push(raw);
        let server_verify = finished_verify_data(
            epoch.protocol_version,
            parts.prf_hash,
            &epoch.master_secret,
            b"server finished",
            &transcript,
        )?;

        let finished = Handshake::Finished(Finished {
            verify_data: Bytes::from(server_verify.clone()),
        });
        let outputs = vec![Output::Record(ContentType::handshake, finished.to_bytes())];

        epoch.reneg = Some(RenegData {
            client_verify_data: fin.verify_data,
            server_verify_data: Bytes::from(server_verify),
        });

        debug!(
            "handshake complete: {:?} {:?}",
            epoch.protocol_version, epoch.cipher_suite
        );
        self.epoch = SessionEpoch::Established(epoch);

        Ok((ServerState::Established, outputs))
    }

    /// Highest configured version not above what the client offered.
    fn negotiate_version(&self, client_version: u16) -> Result<ProtocolVersion> {
        self.options
            .protocol_versions
            .iter()
            .copied()
            .filter(|v| v.to_u16() <= client_version)
            .max()
            .ok_or(Error::ProtocolVersion)
    }

    /// First client-offered suite we accept; client order takes precedence.
    fn negotiate_cipher(
        &self,
        client_suites: &[CipherSuite],
        version: ProtocolVersion,
    ) -> Result<(CipherSuite, CipherSuiteParts)> {
        for suite in client_suites {
            if !self.options.ciphers.contains(suite) {
                continue;
            }
            let parts = match suite.decode() {
                Ok(parts) => parts,
                Err(_) => continue,
            };
            if parts.min_version > version {
                continue;
            }
            if parts.key_exchange.requires_certificate() && self.options.own_certificate.is_none() {
                continue;
            }
            return Ok((*suite, parts));
        }

        Err(Error::HandshakeFailure(
            "no cipher suite in common with the client",
        ))
    }
}

fn validate_client_hello(hello: &ClientHello) -> Result<()> {
    if !hello.compression_methods.contains(&0) {
        return Err(Error::HandshakeFailure(
            "client does not offer null compression",
        ));
    }
    Ok(())
}

fn finish_key_exchange(
    mut epoch: Epoch,
    params: &HandshakeParams,
    mut transcript: Transcript,
    raw: Bytes,
    pre_master_secret: &[u8],
) -> Result<(ServerState, Vec<Output>)> {
    transcript.push(raw);

    let parts = epoch.cipher_suite.decode()?;
    let (master_secret, client_read, server_write) = derive_cipher_contexts(
        epoch.protocol_version,
        epoch.cipher_suite,
        &parts,
        pre_master_secret,
        &params.client_random,
        &params.server_random,
    )?;
    epoch.master_secret = master_secret;

    Ok((
        ServerState::AwaitChangeCipherSpec {
            epoch,
            server_write,
            client_read,
            transcript,
        },
        vec![],
    ))
}
