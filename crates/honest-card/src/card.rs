//! Card creation input.

use ethers::types::U256;

use crate::codec::{self, FieldKind, Gender, COUNTRY_CODES};
use crate::error::{CodecError, ValidationError};
use crate::relayer::EncryptedInputBuilder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardForm {
    /// Stored in the clear.
    pub surname: String,
    pub gender: Gender,
    pub full_name: String,
    pub country_code: String,
    pub phone: String,
    pub social_id: String,
    pub location: String,
}

impl Default for CardForm {
    fn default() -> Self {
        Self {
            surname: String::new(),
            gender: Gender::NotDisclosed,
            full_name: String::new(),
            country_code: "+86".to_string(),
            phone: String::new(),
            social_id: String::new(),
            location: String::new(),
        }
    }
}

impl CardForm {
    /// Required fields are checked in display order; the first missing one
    /// is reported.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            (&self.surname, ValidationError::MissingSurname),
            (&self.full_name, ValidationError::MissingFullName),
            (&self.phone, ValidationError::MissingPhone),
            (&self.social_id, ValidationError::MissingSocialId),
            (&self.location, ValidationError::MissingLocation),
        ];
        for (value, err) in required {
            if value.trim().is_empty() {
                return Err(err);
            }
        }
        if !COUNTRY_CODES
            .iter()
            .any(|(code, _)| *code == self.country_code)
        {
            return Err(ValidationError::UnknownCountryCode(
                self.country_code.clone(),
            ));
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<EncodedCard, ValidationError> {
        self.validate()?;
        Ok(EncodedCard {
            gender: codec::encode_gender(self.gender),
            phone: codec::encode_phone(&self.country_code, &self.phone)?,
            full_name: codec::encode_text(FieldKind::FullName, &self.full_name),
            social_id: codec::encode_text(FieldKind::SocialId, &self.social_id),
            location: codec::encode_text(FieldKind::Location, &self.location),
        })
    }
}

/// Plaintext integers ready for encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedCard {
    pub gender: U256,
    pub phone: U256,
    pub full_name: U256,
    pub social_id: U256,
    pub location: U256,
}

impl EncodedCard {
    /// Add the fields at their widths, in the order `createCard` expects
    /// the resulting handles.
    pub fn add_to(&self, builder: &mut EncryptedInputBuilder) -> Result<(), CodecError> {
        builder
            .add8(self.gender)?
            .add64(self.phone)?
            .add64(self.full_name)?
            .add128(self.social_id)?
            .add256(self.location)?;
        Ok(())
    }
}
