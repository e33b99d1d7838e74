use bytes::Bytes;

use crate::alert::Alert;
use crate::cipher::CipherEndpointSpec;
use crate::error::Error;

tls_enum_u8!(ContentType => {
    change_cipher_spec(20),
    alert(21),
    handshake(22),
    application_data(23),
    (255)
});

/// The one octet body of a ChangeCipherSpec record.
pub const CHANGE_CIPHER_SPEC_BODY: &[u8] = &[1];

/// Signals handed back to the record layer, in order. A ChangeEncryption
/// entry is a barrier: records before it are protected with the old outbound
/// context, records after it with the new one.
#[derive(Debug)]
pub enum Output {
    Record(ContentType, Bytes),
    ChangeEncryption(CipherEndpointSpec),
}

/// Renders the fatal alert record matching a handshake error, for the caller
/// to emit before tearing the connection down.
pub fn fatal_alert(error: &Error) -> Output {
    let mut out = vec![];
    Alert::fatal(error.alert()).serialize(&mut out);
    Output::Record(ContentType::alert, Bytes::from(out))
}
