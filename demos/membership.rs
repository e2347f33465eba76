use sparse_bitmap::{Bitmap, Cursor, Error};

/// Tracks which message IDs out of a noisy stream have been seen, then
/// walks them back in ascending order with a caller-held cursor.
fn main() -> Result<(), Error> {
    let stream = [3usize, 70, 3, 1000, 70, 14, 3];

    let mut seen = Bitmap::new();
    for id in stream {
        if seen.is_set(id) {
            println!("duplicate id {id}");
        } else {
            seen.set(id)?;
        }
    }

    let mut cursor = Cursor::START;
    while let Some(id) = seen.next_member(&mut cursor) {
        println!("seen id {id}");
    }
    assert!(cursor.is_exhausted());

    Ok(())
}
