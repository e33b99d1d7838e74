use crate::error::Result;
use crate::parsing::Reader;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl Alert {
    pub fn fatal(description: AlertDescription) -> Self {
        Self {
            level: AlertLevel::fatal,
            description,
        }
    }

    pub fn parse(r: &mut Reader) -> Result<Self> {
        let level = AlertLevel::parse(r)?;
        let description = AlertDescription::parse(r)?;
        Ok(Self { level, description })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        self.level.serialize(out);
        self.description.serialize(out);
    }
}

tls_enum_u8!(AlertLevel => {
    warning(1), fatal(2), (255)
});

tls_enum_u8!(AlertDescription => {
    close_notify(0),
    unexpected_message(10),
    bad_record_mac(20),
    record_overflow(22),
    handshake_failure(40),
    bad_certificate(42),
    illegal_parameter(47),
    decode_error(50),
    decrypt_error(51),
    protocol_version(70),
    insufficient_security(71),
    internal_error(80),
    no_renegotiation(100),
    (255)
});
