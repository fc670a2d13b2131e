use log::warn;
use phf::phf_map;

use crate::catalog::TypeCode;
use crate::clut::{ClutError, ColorTable};
use crate::icon::{ColorIcon, IconError};
use crate::macroman;
use crate::picture::{Picture, PictureError};
use crate::sound::{self, Sound, SoundError};
use crate::strlist::{StringList, StringListError};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineEnding {
    Cr,
    Nl,
    CrNl,
}

impl LineEnding {
    pub fn from_arg(arg: &str) -> Option<LineEnding> {
        match arg {
            "cr" => Some(LineEnding::Cr),
            "nl" => Some(LineEnding::Nl),
            "crnl" => Some(LineEnding::CrNl),
            _ => None,
        }
    }

    fn replacement(self) -> &'static str {
        match self {
            LineEnding::Cr => "\r",
            LineEnding::Nl => "\n",
            LineEnding::CrNl => "\r\n",
        }
    }
}

pub struct Options {
    pub line_ending: LineEnding,
}

impl Default for Options {
    fn default() -> Options {
        Options{ line_ending: LineEnding::Nl }
    }
}

#[derive(Debug)]
pub enum ConvertError {
    Sound(SoundError),
    Picture(PictureError),
    Icon(IconError),
    ColorTable(ClutError),
    StringList(StringListError),
    Json(serde_json::Error),
}

impl From<SoundError> for ConvertError {
    fn from(error: SoundError) -> Self {
        ConvertError::Sound(error)
    }
}

impl From<PictureError> for ConvertError {
    fn from(error: PictureError) -> Self {
        ConvertError::Picture(error)
    }
}

impl From<IconError> for ConvertError {
    fn from(error: IconError) -> Self {
        ConvertError::Icon(error)
    }
}

impl From<ClutError> for ConvertError {
    fn from(error: ClutError) -> Self {
        ConvertError::ColorTable(error)
    }
}

impl From<StringListError> for ConvertError {
    fn from(error: StringListError) -> Self {
        ConvertError::StringList(error)
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(error: serde_json::Error) -> Self {
        ConvertError::Json(error)
    }
}

type Converter = fn(&[u8], &Options) -> Result<Vec<u8>, ConvertError>;

static CONVERTERS: phf::Map<&'static [u8], Converter> = phf_map! {
    b"TEXT" => convert_text,
    b"STR#" => convert_string_list,
    b"clut" => convert_color_table,
    b"snd " => convert_sound,
    b"PICT" => convert_picture,
    b"cicn" => convert_icon,
};

/// Converts a resource payload according to its type code. Types without a
/// registered converter pass through untouched, which is what `cat` does.
pub fn convert(code: TypeCode, data: &[u8], options: &Options) -> Result<Vec<u8>, ConvertError> {
    match CONVERTERS.get(&code[..]) {
        Some(converter) => converter(data, options),
        None => {
            warn!("no converter for type {:?}; passing raw data through", macroman::decode(&code));
            Ok(data.to_vec())
        }
    }
}

fn convert_text(data: &[u8], options: &Options) -> Result<Vec<u8>, ConvertError> {
    let text = macroman::decode(data);
    Ok(macroman::convert_cr(&text, options.line_ending.replacement()).into_bytes())
}

fn convert_string_list(data: &[u8], _options: &Options) -> Result<Vec<u8>, ConvertError> {
    let list = StringList::parse(data)?;
    Ok(serde_json::to_string_pretty(&list.to_json())?.into_bytes())
}

fn convert_color_table(data: &[u8], _options: &Options) -> Result<Vec<u8>, ConvertError> {
    let table = ColorTable::parse(data)?;
    Ok(serde_json::to_string_pretty(&table.to_json())?.into_bytes())
}

fn convert_sound(data: &[u8], _options: &Options) -> Result<Vec<u8>, ConvertError> {
    Ok(sound::aiff(&Sound::parse(data)?))
}

fn convert_picture(data: &[u8], _options: &Options) -> Result<Vec<u8>, ConvertError> {
    Ok(Picture::parse(data)?.png()?)
}

fn convert_icon(data: &[u8], _options: &Options) -> Result<Vec<u8>, ConvertError> {
    Ok(ColorIcon::parse(data)?.png()?)
}
