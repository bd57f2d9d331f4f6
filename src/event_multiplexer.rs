/// Generates an input enum plus a `<Name>MultiPlexer` struct that waits on one
/// `tokio::sync::mpsc::Receiver` per variant and yields whichever delivers first.
///
/// Two extra variants are added: `Timeout` when nothing arrived within the
/// given number of seconds and `None` once every receiver is closed.
#[macro_export]
macro_rules! define_event_multiplexer {
    (
        $(#[$enum_attr:meta])*
        pub enum $enum_name:ident {
            $(
                $variant:ident($type:ty) => $field_name:ident
            ),* $(,)?
        }
    ) => {
        $(#[$enum_attr])*
        pub enum $enum_name {
            $(
                $variant($type),
            )*
            Timeout,
            None,
        }

        $crate::paste::paste! {
            pub struct [<$enum_name MultiPlexer>] {
                $(
                    pub $field_name: tokio::sync::mpsc::Receiver<$type>,
                )*
            }

            impl [<$enum_name MultiPlexer>] {
                #[allow(clippy::too_many_arguments)]
                pub fn new(
                    $(
                        $field_name: tokio::sync::mpsc::Receiver<$type>,
                    )*
                ) -> Self {
                    Self {
                        $(
                            $field_name,
                        )*
                    }
                }

                /// True once every sender of every receiver is gone.
                pub fn is_closed(&self) -> bool {
                    true $(&& self.$field_name.is_closed())*
                }

                pub async fn next(&mut self, timeout: u64) -> $enum_name {
                    let open = !self.is_closed();
                    tokio::select! {
                        biased;
                        $(
                            Some(event) = self.$field_name.recv() => {
                                $enum_name::$variant(event)
                            }
                        )*
                        _ = tokio::time::sleep(std::time::Duration::from_secs(timeout)), if open => {
                            $crate::log::trace!("No input for {}s", timeout);
                            $enum_name::Timeout
                        },
                        else => {
                            $enum_name::None
                        }
                    }
                }
            }
        }
    };
}
