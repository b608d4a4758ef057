//! Responses for the stateful commands of the fake server.
//!
//! SELECT opens a folder, UID SEARCH filters its messages, and UID
//! FETCH returns whole messages as counted literals:
//!
//! ```text
//! * <seq> FETCH (UID <uid> BODY[] {<length>}
//! <exactly length bytes>
//! )
//! ```

use crate::fake_imap::io::{write_bytes, write_line};
use crate::fake_imap::mailbox::{Folder, Mailbox, TestMessage};
use imap_codec::imap_types::search::SearchKey;
use imap_codec::imap_types::sequence::{SeqOrUid, Sequence, SequenceSet};
use mailparse::MailHeaderMap;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Answer SELECT. Returns the folder name when it exists.
pub async fn handle_select<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    folder_name: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> Option<String> {
    let Some(folder) = mailbox.folder(folder_name) else {
        let _ = write_line(stream, &format!("{tag} NO Folder not found\r\n")).await;
        return None;
    };

    let uidnext = folder
        .messages
        .iter()
        .map(|m| m.uid)
        .max()
        .map_or(1, |max| max + 1);

    let lines = [
        "* FLAGS (\\Seen \\Answered \\Flagged \\Deleted \\Draft)\r\n".to_string(),
        format!("* {} EXISTS\r\n", folder.messages.len()),
        "* 0 RECENT\r\n".to_string(),
        "* OK [UIDVALIDITY 1]\r\n".to_string(),
        format!("* OK [UIDNEXT {uidnext}]\r\n"),
        format!("{tag} OK [READ-ONLY] SELECT completed\r\n"),
    ];
    for line in &lines {
        if write_line(stream, line).await.is_err() {
            return None;
        }
    }
    Some(folder_name.to_string())
}

/// Answer UID SEARCH against the selected folder.
pub async fn handle_uid_search<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    criteria: &[SearchKey<'_>],
    mailbox: &Mailbox,
    selected: Option<&str>,
    stream: &mut BufReader<S>,
) {
    let Some(folder) = selected_folder(tag, mailbox, selected, stream).await else {
        return;
    };

    let uids: Vec<String> = folder
        .messages
        .iter()
        .filter(|m| criteria.iter().all(|key| matches_key(m, key)))
        .map(|m| m.uid.to_string())
        .collect();

    let _ = write_line(stream, &format!("* SEARCH {}\r\n", uids.join(" "))).await;
    let _ = write_line(stream, &format!("{tag} OK SEARCH completed\r\n")).await;
}

/// Answer UID FETCH with full message bodies.
pub async fn handle_uid_fetch<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    sequence_set: &SequenceSet,
    mailbox: &Mailbox,
    selected: Option<&str>,
    stream: &mut BufReader<S>,
) {
    let Some(folder) = selected_folder(tag, mailbox, selected, stream).await else {
        return;
    };

    for uid in requested_uids(sequence_set) {
        let Some((idx, message)) = folder
            .messages
            .iter()
            .enumerate()
            .find(|(_, m)| m.uid == uid)
        else {
            continue;
        };
        if message.broken {
            let _ = write_line(stream, &format!("{tag} NO Message unavailable\r\n")).await;
            return;
        }

        let header = format!(
            "* {} FETCH (UID {uid} BODY[] {{{}}}\r\n",
            idx + 1,
            message.raw.len()
        );
        if write_line(stream, &header).await.is_err()
            || write_bytes(stream, &message.raw).await.is_err()
            || write_line(stream, ")\r\n").await.is_err()
        {
            return;
        }
    }

    let _ = write_line(stream, &format!("{tag} OK FETCH completed\r\n")).await;
}

async fn selected_folder<'m, S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    mailbox: &'m Mailbox,
    selected: Option<&str>,
    stream: &mut BufReader<S>,
) -> Option<&'m Folder> {
    let Some(name) = selected else {
        let _ = write_line(stream, &format!("{tag} BAD No folder selected\r\n")).await;
        return None;
    };
    let folder = mailbox.folder(name);
    if folder.is_none() {
        let _ = write_line(stream, &format!("{tag} BAD Folder not found\r\n")).await;
    }
    folder
}

/// Single UIDs only; that is all `async-imap` sends for one message.
fn requested_uids(sequence_set: &SequenceSet) -> Vec<u32> {
    sequence_set
        .0
        .as_ref()
        .iter()
        .filter_map(|seq| match seq {
            Sequence::Single(SeqOrUid::Value(v)) => Some(v.get()),
            _ => None,
        })
        .collect()
}

fn matches_key(message: &TestMessage, key: &SearchKey<'_>) -> bool {
    match key {
        SearchKey::To(value) => header_contains(&message.raw, "To", value.as_ref()),
        SearchKey::From(value) => header_contains(&message.raw, "From", value.as_ref()),
        SearchKey::And(keys) => keys.as_ref().iter().all(|k| matches_key(message, k)),
        SearchKey::Or(a, b) => matches_key(message, a) || matches_key(message, b),
        SearchKey::Not(k) => !matches_key(message, k),
        _ => true,
    }
}

/// Case-insensitive substring match on every value of `name`, the way
/// IMAP SEARCH header keys behave.
fn header_contains(raw: &[u8], name: &str, needle: &[u8]) -> bool {
    let Ok((headers, _)) = mailparse::parse_headers(raw) else {
        return false;
    };
    let needle = String::from_utf8_lossy(needle).to_lowercase();
    headers
        .get_all_values(name)
        .iter()
        .any(|value| value.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use std::num::NonZeroU32;

    fn raw_to(to: &str) -> Vec<u8> {
        format!("From: a@b.com\r\nTo: {to}\r\nSubject: Test\r\n\r\nBody").into_bytes()
    }

    async fn capture<F, Fut>(run: F) -> String
    where
        F: FnOnce(BufReader<tokio::io::DuplexStream>) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let (client, server) = tokio::io::duplex(8192);
        run(BufReader::new(server)).await;

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn to_header_match_is_case_insensitive_substring() {
        let raw = raw_to("John Doe <John.Doe@example.com>");
        assert!(header_contains(&raw, "To", b"john.doe@example.com"));
        assert!(!header_contains(&raw, "To", b"jane@example.com"));
    }

    #[tokio::test]
    async fn select_reports_exists_and_uidnext() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .message(5, &raw_to("x@example.com"))
            .message(9, &raw_to("y@example.com"))
            .build();

        let output = capture(|mut stream| async move {
            let selected = handle_select("A1", "INBOX", &mailbox, &mut stream).await;
            assert_eq!(selected.as_deref(), Some("INBOX"));
        })
        .await;

        assert!(output.contains("* 2 EXISTS"));
        assert!(output.contains("* OK [UIDNEXT 10]"));
        assert!(output.contains("A1 OK"));
    }

    #[tokio::test]
    async fn select_missing_folder_is_no() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();

        let output = capture(|mut stream| async move {
            assert!(handle_select("A1", "Gone", &mailbox, &mut stream).await.is_none());
        })
        .await;

        assert!(output.contains("A1 NO Folder not found"));
    }

    #[tokio::test]
    async fn fetch_without_selection_is_bad() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();
        let set = SequenceSet(
            vec![Sequence::Single(SeqOrUid::Value(NonZeroU32::new(1).unwrap()))]
                .try_into()
                .unwrap(),
        );

        let output = capture(|mut stream| async move {
            handle_uid_fetch("A1", &set, &mailbox, None, &mut stream).await;
        })
        .await;

        assert!(output.contains("A1 BAD No folder selected"));
    }

    #[tokio::test]
    async fn broken_message_fetch_is_no() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .broken_message(1, &raw_to("x@example.com"))
            .build();
        let set = SequenceSet(
            vec![Sequence::Single(SeqOrUid::Value(NonZeroU32::new(1).unwrap()))]
                .try_into()
                .unwrap(),
        );

        let output = capture(|mut stream| async move {
            handle_uid_fetch("A1", &set, &mailbox, Some("INBOX"), &mut stream).await;
        })
        .await;

        assert_eq!(output, "A1 NO Message unavailable\r\n");
    }
}
