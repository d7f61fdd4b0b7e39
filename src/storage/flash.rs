//! Flash persistence of the configuration image.
//!
//! The whole 512-byte image is one `sequential-storage` map item, so a
//! flush either lands completely or leaves the previous image in place.
//! `sequential-storage` takes care of page rotation and wear levelling.

use defmt::{error, info};
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{fetch_item, store_item};

use super::layout::IMAGE_SIZE;
use super::ConfigImage;
use crate::config::{STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use crate::error::Error;

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Map key of the image item.
const KEY_CONFIG_IMAGE: u8 = 0x01;

/// Item buffer: image plus key and item header, rounded to the write word.
const ITEM_BUFFER_SIZE: usize = IMAGE_SIZE + 16;

/// Load the image from flash. An absent or unreadable item yields a blank
/// image, which the key map treats as a version mismatch.
pub async fn load(flash: &mut impl NorFlash) -> ConfigImage {
    let mut buf = [0u8; ITEM_BUFFER_SIZE];

    match fetch_item::<u8, &[u8], _>(
        flash,
        STORAGE_START..STORAGE_END,
        &mut NoCache::new(),
        &mut buf,
        &KEY_CONFIG_IMAGE,
    )
    .await
    {
        Ok(Some(data)) => {
            info!("Loaded {} byte config image from flash", data.len());
            ConfigImage::from_image(data)
        }
        Ok(None) => {
            info!("No config image in flash");
            ConfigImage::new()
        }
        Err(e) => {
            error!("Flash read error: {:?}", defmt::Debug2Format(&e));
            ConfigImage::new()
        }
    }
}

/// Write the image back if it changed since the last flush. On failure the
/// image stays dirty and the next flush retries.
pub async fn flush(flash: &mut impl NorFlash, image: &mut ConfigImage) -> Result<(), Error> {
    if !image.is_dirty() {
        return Ok(());
    }

    let mut buf = [0u8; ITEM_BUFFER_SIZE];
    let item: &[u8] = image.image();

    match store_item::<u8, &[u8], _>(
        flash,
        STORAGE_START..STORAGE_END,
        &mut NoCache::new(),
        &mut buf,
        &KEY_CONFIG_IMAGE,
        &item,
    )
    .await
    {
        Ok(()) => {
            image.take_dirty();
            info!("Config image saved to flash");
            Ok(())
        }
        Err(e) => {
            error!("Flash write error: {:?}", defmt::Debug2Format(&e));
            Err(Error::Storage)
        }
    }
}
