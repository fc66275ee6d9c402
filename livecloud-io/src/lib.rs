//! Wire format and message transport for livecloud
//! 
//! This crate decodes binary point frames received over a publish/subscribe
//! channel and provides the transport abstraction the viewer reads from.

pub mod frame;
pub mod messaging;

pub use frame::{
    decode_points, encode_points, encode_points_into, DecodeOptions, FrameDecoder, RawFrame,
    TrailingBytes, COORDINATE_SIZE, RECORD_SIZE,
};
pub use messaging::{
    channel, channel_with_capacity, ChannelPublisher, ChannelSource, Message, MessageSource,
    DEFAULT_CHANNEL_CAPACITY,
};
