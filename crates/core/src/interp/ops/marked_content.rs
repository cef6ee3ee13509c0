//! Marked content operators.
//!
//! Handles: BMC, BDC, EMC
//!
//! `MP` and `DP` mark a point rather than a sequence and are dispatched as
//! no-ops.

use tracing::warn;

use crate::error::{PdfError, Result};
use crate::interp::operation::PropertyList;
use crate::interp::processor::ContentStreamProcessor;
use crate::model::objects::{Dictionary, Name};

#[allow(non_snake_case)]
impl ContentStreamProcessor<'_> {
    /// Begins a marked-content sequence.
    ///
    /// PDF operator: `BMC`
    pub fn do_BMC(&mut self, tag: &Name) {
        self.marked_content.push(tag.clone(), Dictionary::new());
    }

    /// Begins a marked-content sequence with a property list, given inline
    /// or by name from the `/Properties` resources. An unknown name opens
    /// the sequence with no properties.
    ///
    /// PDF operator: `BDC`
    pub fn do_BDC(&mut self, tag: &Name, properties: &PropertyList) -> Result<()> {
        let properties = match properties {
            PropertyList::Inline(dict) => dict.clone(),
            PropertyList::Named(name) => match self.resources.marked_content_properties(name) {
                Ok(dict) => dict,
                Err(PdfError::MissingResource { .. }) => {
                    warn!(
                        page = self.page.page_number,
                        properties = %name,
                        "unknown property list, using an empty one"
                    );
                    Dictionary::new()
                }
                Err(err) => return Err(err),
            },
        };
        self.marked_content.push(tag.clone(), properties);
        Ok(())
    }

    /// Ends the innermost marked-content sequence.
    ///
    /// PDF operator: `EMC`
    pub fn do_EMC(&mut self) {
        if self.marked_content.is_empty() {
            warn!(page = self.page.page_number, "EMC without BMC/BDC, ignored");
            return;
        }
        if let Some(root) = self.marked_content.pop() {
            self.content.marked_content.push(root);
        }
    }
}
