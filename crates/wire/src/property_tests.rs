// SPDX-License-Identifier: MIT

//! Property tests for the wire framing: any payload that round-trips
//! through `encode`/`decode` as bytes should also round-trip through the
//! length-prefixed `write_message`/`read_message` transport.

use crate::{read_message, write_message};
use proptest::prelude::*;

fn roundtrip(payload: &[u8]) -> Vec<u8> {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let mut buffer = Vec::new();
        write_message(&mut buffer, payload).await.unwrap();
        let mut cursor = std::io::Cursor::new(buffer);
        read_message(&mut cursor).await.unwrap()
    })
}

proptest! {
    #[test]
    fn framing_preserves_arbitrary_payloads(payload in proptest::collection::vec(any::<u8>(), 0..4096)) {
        prop_assert_eq!(roundtrip(&payload), payload);
    }
}
